use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockwatch_core::ingest::provider::YahooQuoteProvider;

mod prices;
mod snapshot;

#[derive(Debug, Parser)]
#[command(name = "stockwatch_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Refetch the watchlist and overwrite the snapshot file.
    Snapshot {
        /// Fetch and log, but do not write the snapshot file.
        #[arg(long)]
        dry_run: bool,

        /// Keep running, refreshing every SECS seconds.
        #[arg(long, value_name = "SECS")]
        every: Option<u64>,
    },
    /// Record today's closing prices in the date-keyed price history.
    Prices {
        /// Fetch and log, but do not write the history file.
        #[arg(long)]
        dry_run: bool,
    },
}

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

    let args = Args::parse();
    let provider = Arc::new(YahooQuoteProvider::from_settings(&settings)?);

    let res = match args.command {
        Command::Snapshot { dry_run, every } => {
            snapshot::run(&settings, provider, dry_run, every).await
        }
        Command::Prices { dry_run } => prices::run(&settings, provider.as_ref(), dry_run).await,
    };

    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "worker run failed");
    }
    res
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
