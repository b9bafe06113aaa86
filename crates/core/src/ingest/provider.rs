use crate::config::Settings;
use crate::ingest::types::{QuoteInfo, QuoteSummaryEnvelope};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use std::time::Duration;

const QUOTE_SUMMARY_PATH: &str = "/v10/finance/quoteSummary";
const CRUMB_PATH: &str = "/v1/test/getcrumb";
const QUOTE_MODULES: &str = "price,summaryDetail,assetProfile,financialData,majorHoldersBreakdown";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteInfo>;
}

/// Yahoo Finance quoteSummary client.
///
/// The endpoint wants a session cookie plus a matching crumb. Both are obtained lazily on the
/// first request and reused for the lifetime of the client; a crumb the API rejects is
/// discarded so the next call handshakes again. Requests are never retried here.
#[derive(Debug)]
pub struct YahooQuoteProvider {
    http: reqwest::Client,
    base_url: String,
    cookie_url: String,
    crumb: tokio::sync::Mutex<Option<String>>,
}

impl YahooQuoteProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.quote_provider_base_url,
            &settings.quote_provider_cookie_url,
            Duration::from_secs(settings.quote_provider_timeout_secs),
        )
    }

    pub fn new(base_url: &str, cookie_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .context("failed to build quote provider http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_url: cookie_url.to_string(),
            crumb: tokio::sync::Mutex::new(None),
        })
    }

    fn quote_url(&self, symbol: &str) -> String {
        format!("{}{}/{}", self.base_url, QUOTE_SUMMARY_PATH, symbol)
    }

    async fn crumb_cached(&self) -> Result<String> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        let crumb = self.fetch_crumb().await?;
        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_crumb(&self) -> Result<String> {
        // The cookie endpoint typically answers 404; only the Set-Cookie header matters.
        let res = self
            .http
            .get(&self.cookie_url)
            .send()
            .await
            .context("quote provider session cookie request failed")?;
        tracing::debug!(http_status = %res.status(), "quote provider session cookie obtained");

        let url = format!("{}{}", self.base_url, CRUMB_PATH);
        let res = self
            .http
            .get(url)
            .send()
            .await
            .context("quote provider crumb request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read quote provider crumb response")?;
        if !status.is_success() {
            anyhow::bail!("quote provider crumb HTTP {status}: {text}");
        }

        let crumb = text.trim().to_string();
        anyhow::ensure!(
            !crumb.is_empty() && !crumb.contains(char::is_whitespace),
            "quote provider returned an invalid crumb: {text:?}"
        );
        Ok(crumb)
    }

    async fn invalidate_crumb(&self) {
        *self.crumb.lock().await = None;
    }
}

#[async_trait::async_trait]
impl QuoteProvider for YahooQuoteProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_quote_summary"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteInfo> {
        let crumb = self.crumb_cached().await?;

        let res = self
            .http
            .get(self.quote_url(symbol))
            .query(&[("modules", QUOTE_MODULES), ("crumb", crumb.as_str())])
            .send()
            .await
            .with_context(|| format!("quote request failed for {symbol}"))?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.invalidate_crumb().await;
        }

        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read quote response for {symbol}"))?;

        parse_quote_summary(symbol, status, &text)
    }
}

fn parse_quote_summary(symbol: &str, status: StatusCode, text: &str) -> Result<QuoteInfo> {
    let envelope = serde_json::from_str::<QuoteSummaryEnvelope>(text);

    // Provider errors come with a 4xx status and a structured body; prefer the body's message.
    if let Ok(env) = &envelope {
        if let Some(err) = &env.quote_summary.error {
            anyhow::bail!(
                "quote provider error for {symbol} (HTTP {status}): {}: {}",
                err.code,
                err.description
            );
        }
    }

    if !status.is_success() {
        anyhow::bail!("quote provider HTTP {status} for {symbol}: {text}");
    }

    let envelope = envelope
        .with_context(|| format!("quote response for {symbol} is not a quoteSummary document"))?;

    let result = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .with_context(|| format!("quote response for {symbol} has no result"))?;

    Ok(QuoteInfo::from(result))
}


#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned quotes per symbol; symbols without an entry fail.
    #[derive(Debug, Default)]
    pub(crate) struct StubProvider {
        quotes: HashMap<String, QuoteInfo>,
        calls: Mutex<Vec<String>>,
    }

    impl StubProvider {
        pub(crate) fn with_quote(mut self, symbol: &str, quote: QuoteInfo) -> Self {
            self.quotes.insert(symbol.to_string(), quote);
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl QuoteProvider for StubProvider {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_quote(&self, symbol: &str) -> Result<QuoteInfo> {
            self.calls.lock().unwrap().push(symbol.to_string());
            self.quotes
                .get(symbol)
                .cloned()
                .with_context(|| format!("no quote for {symbol}"))
        }
    }
}
