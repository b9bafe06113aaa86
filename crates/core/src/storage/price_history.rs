use super::to_pretty_json;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

/// Daily closing prices keyed by date, then symbol: `{"2026-01-06": {"AAPL": 243.36}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceHistory(pub BTreeMap<String, BTreeMap<String, f64>>);

impl PriceHistory {
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err).with_context(|| format!("read {} failed", path.display())),
        };
        serde_json::from_str(&text)
            .with_context(|| format!("{} is not a date-keyed price history", path.display()))
    }

    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        let body = to_pretty_json(self)?;
        tokio::fs::write(path, body.as_bytes())
            .await
            .with_context(|| format!("write {} failed", path.display()))
    }

    /// Replaces the prices recorded under `date_key`.
    pub fn record_day(&mut self, date_key: &str, prices: BTreeMap<String, f64>) {
        self.0.insert(date_key.to_string(), prices);
    }

    #[cfg(test)]
    fn day(&self, date_key: &str) -> Option<&BTreeMap<String, f64>> {
        self.0.get(date_key)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(s, p)| (s.to_string(), *p)).collect()
    }

    #[tokio::test]
    async fn appends_days_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("price_history.json");

        let mut history = PriceHistory::load(&path).await.unwrap();
        assert!(history.is_empty());
        history.record_day("2026-01-05", prices(&[("AAPL", 243.36)]));
        history.save(&path).await.unwrap();

        let mut history = PriceHistory::load(&path).await.unwrap();
        history.record_day("2026-01-06", prices(&[("AAPL", 245.0), ("NVDA", 140.11)]));
        history.save(&path).await.unwrap();

        let reloaded = PriceHistory::load(&path).await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.day("2026-01-05").unwrap()["AAPL"], 243.36);
        assert_eq!(reloaded.day("2026-01-06").unwrap()["NVDA"], 140.11);
    }

    #[test]
    fn same_day_is_overwritten() {
        let mut history = PriceHistory::default();
        history.record_day("2026-01-06", prices(&[("AAPL", 1.0)]));
        history.record_day("2026-01-06", prices(&[("MSFT", 2.0)]));
        assert_eq!(history.len(), 1);
        assert!(history.day("2026-01-06").unwrap().get("AAPL").is_none());
    }

    #[tokio::test]
    async fn rejects_snapshot_shaped_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock_data.json");
        tokio::fs::write(&path, r#"{"last_updated": "x", "stocks": []}"#)
            .await
            .unwrap();
        assert!(PriceHistory::load(&path).await.is_err());
    }
}
