use anyhow::Context;

use stockwatch_core::config::Settings;
use stockwatch_core::domain::watchlist;
use stockwatch_core::ingest::provider::QuoteProvider;
use stockwatch_core::pipeline;
use stockwatch_core::storage::price_history::PriceHistory;
use stockwatch_core::time::{tw_market, Clock, SystemClock};

pub async fn run(
    settings: &Settings,
    provider: &dyn QuoteProvider,
    dry_run: bool,
) -> anyhow::Result<()> {
    record_today(settings, provider, &SystemClock, dry_run).await?;
    Ok(())
}

/// Returns the number of prices written under today's key.
async fn record_today(
    settings: &Settings,
    provider: &dyn QuoteProvider,
    clock: &dyn Clock,
    dry_run: bool,
) -> anyhow::Result<usize> {
    let date_key = tw_market::date_key(tw_market::taipei_date(clock.now())?);
    tracing::info!(%date_key, "fetching closing prices");

    let symbols = watchlist::price_history_symbols();
    let prices = pipeline::collect_prices(provider, &symbols, settings.fetch_delay()).await;

    if prices.is_empty() {
        tracing::warn!(%date_key, "no prices fetched; price history left untouched");
        return Ok(0);
    }

    let count = prices.len();
    if dry_run {
        tracing::info!(%date_key, count, dry_run = true, "prices fetched (dry-run)");
        return Ok(count);
    }

    let path = &settings.price_history_path;
    let mut history = PriceHistory::load(path)
        .await
        .context("load price history failed")?;
    history.record_day(&date_key, prices);
    history.save(path).await.context("save price history failed")?;

    tracing::info!(%date_key, count, path = %path.display(), "price history saved");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use stockwatch_core::ingest::types::QuoteInfo;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Quotes every symbol except MSFT at a fixed price.
    struct OnePriceProvider(Option<f64>);

    #[async_trait::async_trait]
    impl QuoteProvider for OnePriceProvider {
        fn provider_name(&self) -> &'static str {
            "one_price"
        }

        async fn fetch_quote(&self, symbol: &str) -> anyhow::Result<QuoteInfo> {
            anyhow::ensure!(symbol != "MSFT", "no quote for {symbol}");
            Ok(QuoteInfo {
                regular_market_price: self.0,
                ..QuoteInfo::default()
            })
        }
    }

    fn settings_in(dir: &tempfile::TempDir) -> Settings {
        Settings {
            price_history_path: dir.path().join("price_history.json"),
            fetch_delay_ms: 0,
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn records_prices_under_taipei_date() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);
        // 2026-01-05 20:00 UTC is already 2026-01-06 in Taipei.
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 5, 20, 0, 0).unwrap());

        let n = record_today(&settings, &OnePriceProvider(Some(101.234)), &clock, false)
            .await
            .unwrap();
        assert_eq!(n, 5);

        let history = PriceHistory::load(&settings.price_history_path).await.unwrap();
        let mut expected = PriceHistory::default();
        expected.record_day(
            "2026-01-06",
            ["AAPL", "NVDA", "TSLA", "GOOGL", "AMZN"]
                .into_iter()
                .map(|s| (s.to_string(), 101.23))
                .collect(),
        );
        assert_eq!(history, expected);
    }

    #[tokio::test]
    async fn nothing_written_without_prices_or_on_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 6, 2, 0, 0).unwrap());

        let n = record_today(&settings, &OnePriceProvider(None), &clock, false)
            .await
            .unwrap();
        assert_eq!(n, 0);
        assert!(!settings.price_history_path.exists());

        let n = record_today(&settings, &OnePriceProvider(Some(1.0)), &clock, true)
            .await
            .unwrap();
        assert_eq!(n, 5);
        assert!(!settings.price_history_path.exists());
    }
}
