use std::sync::Arc;
use std::time::Duration;

use stockwatch_core::cache::{RefreshOptions, SnapshotCache};
use stockwatch_core::config::Settings;
use stockwatch_core::ingest::provider::QuoteProvider;
use stockwatch_core::pipeline;
use stockwatch_core::storage::FileSnapshotStore;
use stockwatch_core::time::SystemClock;

pub async fn run(
    settings: &Settings,
    provider: Arc<dyn QuoteProvider>,
    dry_run: bool,
    every: Option<u64>,
) -> anyhow::Result<()> {
    if dry_run {
        let snapshot = pipeline::collect_snapshot(
            provider.as_ref(),
            &settings.watchlist,
            settings.fetch_delay(),
            &SystemClock,
        )
        .await?;
        tracing::info!(
            dry_run = true,
            records = snapshot.stocks.len(),
            last_updated = %snapshot.last_updated,
            "snapshot collected (dry-run)"
        );
        return Ok(());
    }

    let cache = SnapshotCache::new(
        provider,
        Arc::new(FileSnapshotStore::new(settings.stock_data_path.clone())),
        Arc::new(SystemClock),
        RefreshOptions::from_settings(settings),
    );

    let Some(every) = every else {
        cache.refresh().await?;
        return Ok(());
    };

    anyhow::ensure!(every >= 1, "--every must be at least 1 second");
    let period = Duration::from_secs(every);
    tracing::info!(every_secs = every, "refreshing snapshot on a fixed interval");

    loop {
        if let Err(err) = cache.refresh().await {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "scheduled snapshot refresh failed");
        }

        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested; stopping refresh loop");
                return Ok(());
            }
        }
    }
}
