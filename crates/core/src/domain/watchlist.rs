/// Symbols evaluated on every snapshot refresh: US names first, then TWSE listings.
pub const DEFAULT_WATCHLIST: [&str; 11] = [
    "NVDA", "TSLA", "MSTR", "AAPL", "AMD", "COIN", // US
    "2330.TW", "2317.TW", "2603.TW", "3231.TW", "2382.TW", // TW
];

/// Symbols tracked by the daily closing-price history.
pub const PRICE_HISTORY_SYMBOLS: [&str; 6] = ["AAPL", "NVDA", "TSLA", "GOOGL", "MSFT", "AMZN"];

const TAIWAN_SUFFIX: &str = ".TW";

pub fn default_watchlist() -> Vec<String> {
    DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect()
}

pub fn price_history_symbols() -> Vec<String> {
    PRICE_HISTORY_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

/// Parses a comma-separated symbol list. Entries are trimmed and upper-cased; blanks and
/// duplicates are dropped while keeping first-seen order.
pub fn parse_watchlist(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in s.split(',') {
        let sym = part.trim().to_ascii_uppercase();
        if sym.is_empty() || out.contains(&sym) {
            continue;
        }
        out.push(sym);
    }
    out
}

pub fn is_taiwan_listing(symbol: &str) -> bool {
    symbol.ends_with(TAIWAN_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_dedupes_symbols() {
        let parsed = parse_watchlist("nvda, 2330.tw,NVDA ,,aapl");
        assert_eq!(parsed, vec!["NVDA", "2330.TW", "AAPL"]);
    }

    #[test]
    fn detects_taiwan_suffix() {
        assert!(is_taiwan_listing("2330.TW"));
        assert!(!is_taiwan_listing("NVDA"));
        assert!(!is_taiwan_listing("6488.TWO"));
    }
}
