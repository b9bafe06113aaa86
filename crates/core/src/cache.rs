use crate::config::Settings;
use crate::ingest::provider::QuoteProvider;
use crate::pipeline;
use crate::storage::{SnapshotStore, StoredSnapshot};
use crate::time::Clock;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub watchlist: Vec<String>,
    /// A stored snapshot younger than this is served as-is.
    pub max_age: chrono::Duration,
    /// Pause between consecutive provider requests.
    pub fetch_delay: Duration,
}

impl RefreshOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            watchlist: settings.watchlist.clone(),
            max_age: settings.cache_max_age(),
            fetch_delay: settings.fetch_delay(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Refreshed,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Refreshed => "refreshed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedSnapshot {
    pub status: CacheStatus,
    pub snapshot: StoredSnapshot,
}

/// Get-or-refresh gate in front of the snapshot store.
///
/// There is no coordination between callers: two requests that both find the snapshot
/// expired will both refetch and both write, and the last write wins.
pub struct SnapshotCache {
    provider: Arc<dyn QuoteProvider>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    options: RefreshOptions,
}

impl SnapshotCache {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        options: RefreshOptions,
    ) -> Self {
        Self {
            provider,
            store,
            clock,
            options,
        }
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    pub async fn get_or_refresh(&self) -> anyhow::Result<CachedSnapshot> {
        if let Some(stored) = self.fresh_snapshot().await {
            tracing::info!(written_at = %stored.written_at, "serving cached snapshot");
            return Ok(CachedSnapshot {
                status: CacheStatus::Hit,
                snapshot: stored,
            });
        }

        tracing::info!("snapshot expired or missing; fetching new data");
        let stored = self.refresh().await?;
        Ok(CachedSnapshot {
            status: CacheStatus::Refreshed,
            snapshot: stored,
        })
    }

    /// Refetches the whole watchlist and overwrites the stored snapshot.
    pub async fn refresh(&self) -> anyhow::Result<StoredSnapshot> {
        let snapshot = pipeline::collect_snapshot(
            self.provider.as_ref(),
            &self.options.watchlist,
            self.options.fetch_delay,
            self.clock.as_ref(),
        )
        .await?;

        let stored = self.store.save(&snapshot).await?;
        tracing::info!(
            records = snapshot.stocks.len(),
            last_updated = %snapshot.last_updated,
            "snapshot stored"
        );
        Ok(stored)
    }

    // Unreadable or unparsable content counts as a miss.
    async fn fresh_snapshot(&self) -> Option<StoredSnapshot> {
        let stored = match self.store.load().await {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to load stored snapshot");
                return None;
            }
        };

        let age = self.clock.now() - stored.written_at;
        if age >= self.options.max_age {
            tracing::debug!(age_secs = age.num_seconds(), "stored snapshot expired");
            return None;
        }

        if let Err(err) = stored.parse() {
            tracing::warn!(error = %format!("{err:#}"), "stored snapshot is corrupt; refetching");
            return None;
        }

        Some(stored)
    }
}
