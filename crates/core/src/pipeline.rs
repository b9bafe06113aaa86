use crate::domain::stock::{round_to, StockRecord, StockSnapshot};
use crate::ingest::provider::QuoteProvider;
use crate::time::{tw_market, Clock};
use std::collections::BTreeMap;
use std::time::Duration;

/// Fetches one symbol and derives its record. Failures are logged and yield `None`.
pub async fn analyze_symbol(provider: &dyn QuoteProvider, symbol: &str) -> Option<StockRecord> {
    tracing::info!(%symbol, provider = provider.provider_name(), "analyzing symbol");
    match provider.fetch_quote(symbol).await {
        Ok(quote) => Some(StockRecord::from_quote(symbol, &quote)),
        Err(err) => {
            tracing::warn!(%symbol, error = %format!("{err:#}"), "quote fetch failed; skipping symbol");
            None
        }
    }
}

/// Walks the watchlist one symbol at a time, sleeping `delay` between requests, and stamps the
/// result once the last symbol is done. Failed symbols are left out.
pub async fn collect_snapshot(
    provider: &dyn QuoteProvider,
    watchlist: &[String],
    delay: Duration,
    clock: &dyn Clock,
) -> anyhow::Result<StockSnapshot> {
    let mut stocks = Vec::with_capacity(watchlist.len());
    for (idx, symbol) in watchlist.iter().enumerate() {
        if idx != 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(record) = analyze_symbol(provider, symbol).await {
            stocks.push(record);
        }
    }

    let skipped = watchlist.len() - stocks.len();
    tracing::info!(
        total = watchlist.len(),
        records = stocks.len(),
        skipped,
        "snapshot collected"
    );

    Ok(StockSnapshot {
        last_updated: tw_market::format_last_updated(clock.now())?,
        stocks,
    })
}

/// Last price per symbol, rounded to 2 dp. Symbols that fail or have no price are left out.
pub async fn collect_prices(
    provider: &dyn QuoteProvider,
    symbols: &[String],
    delay: Duration,
) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    for (idx, symbol) in symbols.iter().enumerate() {
        if idx != 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match provider.fetch_quote(symbol).await {
            Ok(quote) => match quote.last_price() {
                Some(price) => {
                    let price = round_to(price, 2);
                    tracing::info!(%symbol, price, "price fetched");
                    out.insert(symbol.clone(), price);
                }
                None => tracing::warn!(%symbol, "quote has no price; skipping symbol"),
            },
            Err(err) => {
                tracing::warn!(%symbol, error = %format!("{err:#}"), "price fetch failed; skipping symbol");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stock::Market;
    use crate::ingest::provider::testing::StubProvider;
    use crate::ingest::types::QuoteInfo;
    use crate::time::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn quote(price: f64, target: Option<f64>, rec: &str) -> QuoteInfo {
        QuoteInfo {
            current_price: Some(price),
            previous_close: Some(price),
            short_name: Some(format!("Name {price}")),
            target_mean_price: target,
            recommendation_key: Some(rec.to_string()),
            ..QuoteInfo::default()
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 6, 1, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn failed_symbol_does_not_affect_others() {
        let provider = StubProvider::default()
            .with_quote("NVDA", quote(100.0, Some(120.0), "buy"))
            .with_quote("2330.TW", quote(1000.0, Some(900.0), "hold"));

        let watchlist = symbols(&["NVDA", "BROKEN", "2330.TW"]);
        let snapshot = collect_snapshot(&provider, &watchlist, Duration::ZERO, &clock())
            .await
            .unwrap();

        assert_eq!(provider.calls(), watchlist);
        assert_eq!(snapshot.last_updated, "2026-01-06 09:00:00");
        assert_eq!(snapshot.stocks.len(), 2);
        assert_eq!(snapshot.stocks[0].symbol, "NVDA");
        assert_eq!(snapshot.stocks[0].market, Market::Us);
        assert!(snapshot.stocks[0].evaluation.contains("20.0%"));
        assert_eq!(snapshot.stocks[1].symbol, "2330.TW");
        assert_eq!(snapshot.stocks[1].market, Market::Taiwan);
        assert_eq!(
            snapshot.stocks[1].evaluation,
            "目前價格已高於分析師平均目標價，建議觀望或適度止盈。"
        );
    }

    #[tokio::test]
    async fn all_failures_yield_empty_snapshot() {
        let provider = StubProvider::default();
        let snapshot = collect_snapshot(&provider, &symbols(&["A", "B"]), Duration::ZERO, &clock())
            .await
            .unwrap();
        assert!(snapshot.stocks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_symbols_only() {
        let provider = StubProvider::default()
            .with_quote("A", quote(1.0, None, "none"))
            .with_quote("B", quote(2.0, None, "none"))
            .with_quote("C", quote(3.0, None, "none"));

        let start = tokio::time::Instant::now();
        collect_snapshot(
            &provider,
            &symbols(&["A", "B", "C"]),
            Duration::from_millis(500),
            &clock(),
        )
        .await
        .unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn collects_rounded_prices_and_skips_failures() {
        let provider = StubProvider::default()
            .with_quote("AAPL", quote(243.3649, None, "buy"))
            .with_quote("MSFT", QuoteInfo::default());

        let prices = collect_prices(&provider, &symbols(&["AAPL", "MSFT", "GOOGL"]), Duration::ZERO).await;
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["AAPL"], 243.36);
    }
}
