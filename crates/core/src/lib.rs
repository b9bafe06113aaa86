pub mod cache;
pub mod domain;
pub mod ingest;
pub mod pipeline;
pub mod storage;
pub mod time;

pub mod config {
    use crate::domain::watchlist;
    use std::path::PathBuf;
    use std::time::Duration;

    pub const DEFAULT_QUOTE_PROVIDER_BASE_URL: &str = "https://query1.finance.yahoo.com";
    pub const DEFAULT_QUOTE_PROVIDER_COOKIE_URL: &str = "https://fc.yahoo.com";

    const DEFAULT_PORT: u16 = 5001;
    const DEFAULT_STOCK_DATA_PATH: &str = "stock_data.json";
    const DEFAULT_PRICE_HISTORY_PATH: &str = "price_history.json";
    const DEFAULT_STATIC_DIR: &str = "static";
    const DEFAULT_CACHE_SECONDS: u64 = 300;
    const DEFAULT_FETCH_DELAY_MS: u64 = 500;
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub port: u16,
        pub stock_data_path: PathBuf,
        pub price_history_path: PathBuf,
        pub static_dir: PathBuf,
        pub cache_seconds: u64,
        pub fetch_delay_ms: u64,
        pub watchlist: Vec<String>,
        pub quote_provider_base_url: String,
        pub quote_provider_cookie_url: String,
        pub quote_provider_timeout_secs: u64,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                sentry_dsn: None,
                port: DEFAULT_PORT,
                stock_data_path: PathBuf::from(DEFAULT_STOCK_DATA_PATH),
                price_history_path: PathBuf::from(DEFAULT_PRICE_HISTORY_PATH),
                static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
                cache_seconds: DEFAULT_CACHE_SECONDS,
                fetch_delay_ms: DEFAULT_FETCH_DELAY_MS,
                watchlist: watchlist::default_watchlist(),
                quote_provider_base_url: DEFAULT_QUOTE_PROVIDER_BASE_URL.to_string(),
                quote_provider_cookie_url: DEFAULT_QUOTE_PROVIDER_COOKIE_URL.to_string(),
                quote_provider_timeout_secs: DEFAULT_TIMEOUT_SECS,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self::from_lookup(|key| std::env::var(key).ok()))
        }

        fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
            let mut out = Self::default();

            out.sentry_dsn = var("SENTRY_DSN").filter(|s| !s.trim().is_empty());

            if let Some(s) = non_empty(var("STOCK_DATA_PATH")) {
                out.stock_data_path = PathBuf::from(s);
            }
            if let Some(s) = non_empty(var("PRICE_HISTORY_PATH")) {
                out.price_history_path = PathBuf::from(s);
            }
            if let Some(s) = non_empty(var("STATIC_DIR")) {
                out.static_dir = PathBuf::from(s);
            }

            if let Some(n) = var("PORT").and_then(|s| s.trim().parse::<u16>().ok()) {
                out.port = n;
            }
            if let Some(n) = var("CACHE_SECONDS").and_then(|s| s.trim().parse::<u64>().ok()) {
                out.cache_seconds = n;
            }
            if let Some(n) = var("FETCH_DELAY_MS").and_then(|s| s.trim().parse::<u64>().ok()) {
                out.fetch_delay_ms = n;
            }
            if let Some(n) =
                var("QUOTE_PROVIDER_TIMEOUT_SECS").and_then(|s| s.trim().parse::<u64>().ok())
            {
                out.quote_provider_timeout_secs = n;
            }

            if let Some(s) = var("WATCHLIST") {
                let parsed = watchlist::parse_watchlist(&s);
                if !parsed.is_empty() {
                    out.watchlist = parsed;
                }
            }

            if let Some(s) = non_empty(var("QUOTE_PROVIDER_BASE_URL")) {
                out.quote_provider_base_url = s;
            }
            if let Some(s) = non_empty(var("QUOTE_PROVIDER_COOKIE_URL")) {
                out.quote_provider_cookie_url = s;
            }

            out
        }

        pub fn cache_max_age(&self) -> chrono::Duration {
            chrono::Duration::seconds(self.cache_seconds as i64)
        }

        pub fn fetch_delay(&self) -> Duration {
            Duration::from_millis(self.fetch_delay_ms)
        }

        pub fn index_html_path(&self) -> PathBuf {
            self.static_dir.join("index.html")
        }
    }

    fn non_empty(v: Option<String>) -> Option<String> {
        v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn settings_from(pairs: &[(&str, &str)]) -> Settings {
            let env: HashMap<String, String> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Settings::from_lookup(|key| env.get(key).cloned())
        }

        #[test]
        fn defaults_match_the_dashboard_deployment() {
            let s = settings_from(&[]);
            assert_eq!(s.port, 5001);
            assert_eq!(s.cache_seconds, 300);
            assert_eq!(s.fetch_delay_ms, 500);
            assert_eq!(s.stock_data_path, PathBuf::from("stock_data.json"));
            assert_eq!(s.watchlist.len(), 11);
            assert_eq!(s.watchlist[0], "NVDA");
            assert!(s.sentry_dsn.is_none());
        }

        #[test]
        fn overrides_are_read_and_bad_numbers_ignored() {
            let s = settings_from(&[
                ("PORT", "8080"),
                ("CACHE_SECONDS", "60"),
                ("FETCH_DELAY_MS", "not-a-number"),
                ("WATCHLIST", " msft , 2330.tw ,, "),
                ("STOCK_DATA_PATH", "/tmp/snap.json"),
                ("SENTRY_DSN", "  "),
            ]);
            assert_eq!(s.port, 8080);
            assert_eq!(s.cache_seconds, 60);
            assert_eq!(s.fetch_delay_ms, 500);
            assert_eq!(s.watchlist, vec!["MSFT".to_string(), "2330.TW".to_string()]);
            assert_eq!(s.stock_data_path, PathBuf::from("/tmp/snap.json"));
            assert!(s.sentry_dsn.is_none());
        }

        #[test]
        fn empty_watchlist_override_keeps_default() {
            let s = settings_from(&[("WATCHLIST", " , ")]);
            assert_eq!(s.watchlist, watchlist::default_watchlist());
        }

        #[test]
        fn out_of_range_port_falls_back_to_default() {
            assert_eq!(settings_from(&[("PORT", "70000")]).port, 5001);
            assert_eq!(settings_from(&[("PORT", "")]).port, 5001);
        }
    }
}
