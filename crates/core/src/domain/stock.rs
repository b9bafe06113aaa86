use crate::domain::evaluation::evaluate;
use crate::domain::watchlist::is_taiwan_listing;
use crate::ingest::types::QuoteInfo;
use serde::{Deserialize, Serialize};

pub const SUMMARY_MAX_CHARS: usize = 150;
const SUMMARY_ELLIPSIS: &str = "...";
const SUMMARY_MISSING: &str = "無";
const RECOMMENDATION_MISSING: &str = "N/A";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockSnapshot {
    pub last_updated: String,
    pub stocks: Vec<StockRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockRecord {
    pub symbol: String,
    pub name: String,
    pub price: Option<f64>,
    pub change: f64,
    pub summary: String,
    pub target_price: Option<f64>,
    pub recommendation: String,
    pub analyst_count: u32,
    pub inst_pct: f64,
    pub evaluation: String,
    pub market: Market,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Market {
    #[serde(rename = "台股")]
    Taiwan,
    #[serde(rename = "美股")]
    Us,
}

impl Market {
    pub fn for_symbol(symbol: &str) -> Self {
        if is_taiwan_listing(symbol) {
            Market::Taiwan
        } else {
            Market::Us
        }
    }
}

impl StockRecord {
    pub fn from_quote(symbol: &str, quote: &QuoteInfo) -> Self {
        let price = quote.last_price();
        let target_price = quote.target_mean_price;
        let recommendation = humanize_recommendation(quote.recommendation_key.as_deref());
        let evaluation = evaluate(price, target_price, &recommendation);

        Self {
            symbol: symbol.to_string(),
            name: quote
                .short_name
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| symbol.to_string()),
            price,
            change: percent_change(price, quote.previous_close),
            summary: truncate_summary(
                quote
                    .long_business_summary
                    .as_deref()
                    .unwrap_or(SUMMARY_MISSING),
            ),
            target_price,
            recommendation,
            analyst_count: quote.number_of_analyst_opinions.unwrap_or(0),
            inst_pct: round_to(quote.held_percent_institutions.unwrap_or(0.0) * 100.0, 1),
            evaluation: evaluation.to_string(),
            market: Market::for_symbol(symbol),
        }
    }
}

/// Day change in percent, rounded to 2 dp. Missing or zero inputs yield 0.
pub fn percent_change(price: Option<f64>, previous_close: Option<f64>) -> f64 {
    match (price, previous_close) {
        (Some(p), Some(prev)) if p != 0.0 && prev != 0.0 => round_to((p - prev) / prev * 100.0, 2),
        _ => 0.0,
    }
}

/// Keeps the first 150 characters and always appends an ellipsis.
pub fn truncate_summary(summary: &str) -> String {
    let mut out: String = summary.chars().take(SUMMARY_MAX_CHARS).collect();
    out.push_str(SUMMARY_ELLIPSIS);
    out
}

/// "strong_buy" -> "Strong Buy"; missing keys become "N/A".
pub fn humanize_recommendation(key: Option<&str>) -> String {
    let key = key
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(RECOMMENDATION_MISSING);
    title_case(&key.replace('_', " "))
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// Rounds to `decimals` places against the exact binary value of `v`, exact ties to even.
///
/// `(v * 10^n).round()` would both round ties away from zero and pick up the error of the
/// multiplication (2.675 is stored as 2.67499.. and must stay 2.67).
pub(crate) fn round_to(v: f64, decimals: u32) -> f64 {
    if !v.is_finite() || v == 0.0 {
        return v;
    }

    let bits = v.to_bits();
    let biased_exp = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if biased_exp == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased_exp - 1075)
    };
    if exp >= 0 {
        // No fractional bits.
        return v;
    }

    // |v| * 10^n == scaled / 2^shift, exactly.
    let shift = exp.unsigned_abs();
    let scaled = mantissa as u128 * 10u128.pow(decimals);
    let rounded = if shift >= 120 {
        0
    } else {
        let quotient = scaled >> shift;
        let remainder = scaled & ((1u128 << shift) - 1);
        let half = 1u128 << (shift - 1);
        if remainder > half || (remainder == half && quotient & 1 == 1) {
            quotient + 1
        } else {
            quotient
        }
    };

    (rounded as f64 / 10f64.powi(decimals as i32)).copysign(v)
}
