use crate::domain::stock::StockSnapshot;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod file;
pub mod memory;
pub mod price_history;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

/// A persisted snapshot exactly as written, with the time it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub written_at: DateTime<Utc>,
    pub body: String,
}

impl StoredSnapshot {
    pub fn parse(&self) -> anyhow::Result<StockSnapshot> {
        serde_json::from_str(&self.body).context("stored snapshot is not valid snapshot JSON")
    }
}

#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self) -> anyhow::Result<Option<StoredSnapshot>>;

    /// Replaces whatever was stored before.
    async fn save(&self, snapshot: &StockSnapshot) -> anyhow::Result<StoredSnapshot>;
}

/// Pretty JSON with 4-space indentation. Non-ASCII text is written as-is.
pub fn to_pretty_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .context("serialize pretty JSON failed")?;
    String::from_utf8(buf).context("serialized JSON is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pretty_json_uses_four_spaces_and_keeps_cjk() {
        let s = to_pretty_json(&json!({"market": "台股"})).unwrap();
        assert_eq!(s, "{\n    \"market\": \"台股\"\n}");
    }
}
