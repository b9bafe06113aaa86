use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockwatch_core::cache::{RefreshOptions, SnapshotCache};
use stockwatch_core::ingest::provider::YahooQuoteProvider;
use stockwatch_core::storage::FileSnapshotStore;
use stockwatch_core::time::SystemClock;

mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockwatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let provider = YahooQuoteProvider::from_settings(&settings)?;
    let store = FileSnapshotStore::new(settings.stock_data_path.clone());
    let cache = SnapshotCache::new(
        Arc::new(provider),
        Arc::new(store),
        Arc::new(SystemClock),
        RefreshOptions::from_settings(&settings),
    );

    let state = routes::AppState {
        cache: Arc::new(cache),
    };
    let app = routes::create_router(state, settings.index_html_path());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));

    tracing::info!(
        %addr,
        snapshot = %settings.stock_data_path.display(),
        watchlist_len = settings.watchlist.len(),
        cache_seconds = settings.cache_seconds,
        "api listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &stockwatch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
