use super::{to_pretty_json, SnapshotStore, StoredSnapshot};
use crate::domain::stock::StockSnapshot;
use crate::time::Clock;
use std::sync::Arc;

/// In-process snapshot store; write times come from the injected clock.
pub struct MemorySnapshotStore {
    clock: Arc<dyn Clock>,
    slot: tokio::sync::RwLock<Option<StoredSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slot: tokio::sync::RwLock::new(None),
        }
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> anyhow::Result<Option<StoredSnapshot>> {
        Ok(self.slot.read().await.clone())
    }

    async fn save(&self, snapshot: &StockSnapshot) -> anyhow::Result<StoredSnapshot> {
        let stored = StoredSnapshot {
            written_at: self.clock.now(),
            body: to_pretty_json(snapshot)?,
        };
        *self.slot.write().await = Some(stored.clone());
        Ok(stored)
    }
}
