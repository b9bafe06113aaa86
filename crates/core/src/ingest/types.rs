use serde::Deserialize;

/// Flattened quote and analyst fields for one symbol, independent of the provider's wire shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteInfo {
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub short_name: Option<String>,
    pub long_business_summary: Option<String>,
    pub target_mean_price: Option<f64>,
    pub recommendation_key: Option<String>,
    pub number_of_analyst_opinions: Option<u32>,
    pub held_percent_institutions: Option<f64>,
}

impl QuoteInfo {
    /// Last traded price, preferring the analyst module's current price.
    pub fn last_price(&self) -> Option<f64> {
        self.current_price.or(self.regular_market_price)
    }
}

// Yahoo quoteSummary wire types. Numeric fields arrive as {"raw": .., "fmt": ..} objects,
// and any module or field may be absent or an empty object.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteSummaryEnvelope {
    pub quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QuoteSummaryBody {
    #[serde(default)]
    pub result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    pub error: Option<QuoteSummaryError>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QuoteSummaryError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteSummaryResult {
    #[serde(default)]
    pub price: Option<PriceModule>,
    #[serde(default)]
    pub summary_detail: Option<SummaryDetailModule>,
    #[serde(default)]
    pub asset_profile: Option<AssetProfileModule>,
    #[serde(default)]
    pub financial_data: Option<FinancialDataModule>,
    #[serde(default)]
    pub major_holders_breakdown: Option<MajorHoldersModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawValue {
    #[serde(default)]
    pub raw: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PriceModule {
    #[serde(default)]
    pub regular_market_price: Option<RawValue>,
    #[serde(default)]
    pub regular_market_previous_close: Option<RawValue>,
    #[serde(default)]
    pub short_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SummaryDetailModule {
    #[serde(default)]
    pub previous_close: Option<RawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssetProfileModule {
    #[serde(default)]
    pub long_business_summary: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FinancialDataModule {
    #[serde(default)]
    pub current_price: Option<RawValue>,
    #[serde(default)]
    pub target_mean_price: Option<RawValue>,
    #[serde(default)]
    pub recommendation_key: Option<String>,
    #[serde(default)]
    pub number_of_analyst_opinions: Option<RawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MajorHoldersModule {
    #[serde(default)]
    pub institutions_percent_held: Option<RawValue>,
}

fn raw(v: &Option<RawValue>) -> Option<f64> {
    v.as_ref().and_then(|r| r.raw).filter(|n| n.is_finite())
}

impl From<QuoteSummaryResult> for QuoteInfo {
    fn from(r: QuoteSummaryResult) -> Self {
        let price = r.price.unwrap_or_default();
        let detail = r.summary_detail.unwrap_or_default();
        let profile = r.asset_profile.unwrap_or_default();
        let financial = r.financial_data.unwrap_or_default();
        let holders = r.major_holders_breakdown.unwrap_or_default();

        QuoteInfo {
            current_price: raw(&financial.current_price),
            regular_market_price: raw(&price.regular_market_price),
            previous_close: raw(&detail.previous_close)
                .or_else(|| raw(&price.regular_market_previous_close)),
            short_name: price.short_name.filter(|s| !s.trim().is_empty()),
            long_business_summary: profile.long_business_summary,
            target_mean_price: raw(&financial.target_mean_price),
            recommendation_key: financial.recommendation_key,
            number_of_analyst_opinions: raw(&financial.number_of_analyst_opinions)
                .filter(|n| *n >= 0.0)
                .map(|n| n as u32),
            held_percent_institutions: raw(&holders.institutions_percent_held),
        }
    }
}
