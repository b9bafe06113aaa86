use super::{to_pretty_json, SnapshotStore, StoredSnapshot};
use crate::domain::stock::StockSnapshot;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Snapshot persisted as a single JSON file. The file's mtime is the write time.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    // Unique per write so overlapping refreshes never share a temp file.
    fn tmp_path(&self) -> PathBuf {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(format!(".{}.{seq}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

fn modified_at(meta: &Metadata, path: &Path) -> anyhow::Result<DateTime<Utc>> {
    let modified = meta
        .modified()
        .with_context(|| format!("mtime unavailable for {}", path.display()))?;
    Ok(DateTime::<Utc>::from(modified))
}

// Stats the temp file before the rename; rename keeps the mtime.
async fn write_temp(tmp: &Path, body: &str) -> anyhow::Result<DateTime<Utc>> {
    tokio::fs::write(tmp, body.as_bytes())
        .await
        .with_context(|| format!("write {} failed", tmp.display()))?;
    let meta = tokio::fs::metadata(tmp)
        .await
        .with_context(|| format!("stat {} failed", tmp.display()))?;
    modified_at(&meta, tmp)
}

#[async_trait::async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> anyhow::Result<Option<StoredSnapshot>> {
        // Body and mtime come from one handle, so a concurrent rename cannot mix two writes.
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("open {} failed", self.path.display()))
            }
        };
        let meta = file
            .metadata()
            .await
            .with_context(|| format!("stat {} failed", self.path.display()))?;
        let written_at = modified_at(&meta, &self.path)?;

        let mut body = String::new();
        file.read_to_string(&mut body)
            .await
            .with_context(|| format!("read {} failed", self.path.display()))?;
        Ok(Some(StoredSnapshot { written_at, body }))
    }

    async fn save(&self, snapshot: &StockSnapshot) -> anyhow::Result<StoredSnapshot> {
        let body = to_pretty_json(snapshot)?;

        // Write-then-rename so readers never observe a half-written file.
        let tmp = self.tmp_path();
        let written_at = match write_temp(&tmp, &body).await {
            Ok(t) => t,
            Err(err) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(err);
            }
        };

        if let Err(err) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err).with_context(|| format!("replace {} failed", self.path.display()));
        }

        tracing::debug!(path = %self.path.display(), bytes = body.len(), "snapshot file written");
        Ok(StoredSnapshot { written_at, body })
    }
}
