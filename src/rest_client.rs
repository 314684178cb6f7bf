use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::QuoteConfig;
use crate::error::{DashboardError, DashboardResult};

/// Raw fields a quote provider may report. Any of them can be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderQuote {
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub beta: Option<f64>,
    pub short_name: Option<String>,
    pub sector: Option<String>,
}

#[async_trait]
pub trait QuoteProvider {
    async fn fetch_quote(&self, symbol: &str) -> DashboardResult<ProviderQuote>;
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ChartMeta {
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
    short_name: Option<String>,
    long_name: Option<String>,
}

impl From<ChartMeta> for ProviderQuote {
    fn from(meta: ChartMeta) -> Self {
        Self {
            current_price: None,
            regular_market_price: meta.regular_market_price,
            previous_close: meta.previous_close.or(meta.chart_previous_close),
            beta: None,
            short_name: meta.short_name.or(meta.long_name),
            sector: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    result: Option<Vec<SummaryModules>>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    code: String,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryModules {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetailModule>,
    financial_data: Option<FinancialDataModule>,
    asset_profile: Option<AssetProfileModule>,
}

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNumber {
    raw: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    regular_market_price: Option<RawNumber>,
    short_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryDetailModule {
    previous_close: Option<RawNumber>,
    beta: Option<RawNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FinancialDataModule {
    current_price: Option<RawNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AssetProfileModule {
    sector: Option<String>,
}

fn raw(n: Option<RawNumber>) -> Option<f64> {
    n.and_then(|n| n.raw)
}

fn flatten(m: SummaryModules) -> ProviderQuote {
    let (regular_market_price, short_name) = match m.price {
        Some(p) => (raw(p.regular_market_price), p.short_name),
        None => (None, None),
    };
    let (previous_close, beta) = match m.summary_detail {
        Some(d) => (raw(d.previous_close), raw(d.beta)),
        None => (None, None),
    };

    ProviderQuote {
        current_price: m.financial_data.and_then(|f| raw(f.current_price)),
        regular_market_price,
        previous_close,
        beta,
        short_name,
        sector: m.asset_profile.and_then(|a| a.sector),
    }
}

/// Chart fields win where both sources report a value; the profile only fills gaps
/// and adds what the chart never carries (current price, beta, sector).
fn merge_profile(chart: ProviderQuote, profile: ProviderQuote) -> ProviderQuote {
    ProviderQuote {
        current_price: profile.current_price,
        regular_market_price: chart.regular_market_price.or(profile.regular_market_price),
        previous_close: chart.previous_close.or(profile.previous_close),
        beta: profile.beta,
        short_name: chart.short_name.or(profile.short_name),
        sector: profile.sector,
    }
}

fn unavailable(symbol: &str, err: ProviderError) -> DashboardError {
    DashboardError::QuoteUnavailable(format!("{}: {} ({})", symbol, err.description, err.code))
}

/// Yahoo Finance client. Prices come from the crumb-free chart endpoint; beta and
/// sector come from `quoteSummary`, which needs a session cookie plus crumb.
pub struct YahooClient {
    pub client: Client,
    pub base_url: String,
    pub cookie_url: String,
    pub enrich_profile: bool,
    crumb: Mutex<Option<String>>,
}

impl YahooClient {
    pub fn new(config: &QuoteConfig) -> DashboardResult<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .cookie_store(true);
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder.build().map_err(|e| {
            DashboardError::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie_url: config.cookie_url.clone(),
            enrich_profile: config.enrich_profile,
            crumb: Mutex::new(None),
        })
    }

    fn parse_chart(symbol: &str, body: ChartResponse) -> DashboardResult<ProviderQuote> {
        if let Some(err) = body.chart.error {
            return Err(unavailable(symbol, err));
        }

        body.chart
            .result
            .and_then(|r| r.into_iter().next())
            .map(|data| ProviderQuote::from(data.meta))
            .ok_or_else(|| {
                DashboardError::QuoteUnavailable(format!("No chart data returned for {}", symbol))
            })
    }

    fn parse_summary(symbol: &str, body: SummaryResponse) -> DashboardResult<ProviderQuote> {
        if let Some(err) = body.quote_summary.error {
            return Err(unavailable(symbol, err));
        }

        body.quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .map(flatten)
            .ok_or_else(|| {
                DashboardError::QuoteUnavailable(format!("No quote data returned for {}", symbol))
            })
    }

    async fn fetch_chart(&self, symbol: &str) -> DashboardResult<ProviderQuote> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        info!("Fetching chart quote for {}", symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DashboardError::QuoteUnavailable(format!(
                "Quote provider returned {} for {}",
                response.status(),
                symbol
            )));
        }

        let body = response.json::<ChartResponse>().await?;
        Self::parse_chart(symbol, body)
    }

    async fn crumb(&self) -> DashboardResult<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // Only the cookie matters here; this host usually answers 404.
        self.client.get(&self.cookie_url).send().await?;

        let response = self
            .client
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(DashboardError::QuoteUnavailable(format!(
                "Crumb request returned {}",
                response.status()
            )));
        }

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() {
            return Err(DashboardError::QuoteUnavailable("Empty crumb".to_string()));
        }
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_profile(&self, symbol: &str) -> DashboardResult<ProviderQuote> {
        let crumb = self.crumb().await?;
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("modules", "price,summaryDetail,financialData,assetProfile"),
                ("crumb", crumb.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::UNAUTHORIZED {
                *self.crumb.lock().await = None;
            }
            return Err(DashboardError::QuoteUnavailable(format!(
                "Quote summary returned {} for {}",
                response.status(),
                symbol
            )));
        }

        let body = response.json::<SummaryResponse>().await?;
        Self::parse_summary(symbol, body)
    }
}

#[async_trait]
impl QuoteProvider for YahooClient {
    async fn fetch_quote(&self, symbol: &str) -> DashboardResult<ProviderQuote> {
        let mut quote = self.fetch_chart(symbol).await?;

        if self.enrich_profile {
            match self.fetch_profile(symbol).await {
                Ok(profile) => quote = merge_profile(quote, profile),
                Err(e) => debug!("Profile lookup for {} skipped: {}", symbol, e),
            }
        }

        debug!("Provider quote for {}: {:?}", symbol, quote);
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chart_meta() {
        let json = r#"{"chart": {"result": [{
            "meta": {"currency": "USD", "symbol": "TQQQ", "regularMarketPrice": 60.12,
                     "chartPreviousClose": 59.4, "shortName": "ProShares UltraPro QQQ",
                     "longName": "ProShares UltraPro QQQ ETF"},
            "timestamp": [1700000000],
            "indicators": {"quote": [{"close": [60.12]}]}
        }], "error": null}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        let quote = YahooClient::parse_chart("TQQQ", body).unwrap();

        assert_eq!(quote.current_price, None);
        assert_eq!(quote.regular_market_price, Some(60.12));
        assert_eq!(quote.previous_close, Some(59.4));
        assert_eq!(quote.short_name.as_deref(), Some("ProShares UltraPro QQQ"));
        assert_eq!(quote.beta, None);
        assert_eq!(quote.sector, None);
    }

    #[test]
    fn chart_falls_back_to_long_name_and_previous_close() {
        let json = r#"{"chart": {"result": [{"meta": {"previousClose": 10.5, "longName": "Acme Corp"}}],
            "error": null}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        let quote = YahooClient::parse_chart("ACME", body).unwrap();

        assert_eq!(quote.regular_market_price, None);
        assert_eq!(quote.previous_close, Some(10.5));
        assert_eq!(quote.short_name.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn chart_error_is_quote_unavailable() {
        let json = r#"{"chart": {"result": null,
            "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        let err = YahooClient::parse_chart("ZZZZ", body).unwrap_err();
        assert!(matches!(err, DashboardError::QuoteUnavailable(ref m) if m.contains("delisted")));
    }

    #[test]
    fn profile_fills_beta_sector_and_current_price() {
        let chart = ProviderQuote {
            regular_market_price: Some(181.5),
            previous_close: None,
            short_name: Some("NVIDIA Corporation".into()),
            ..Default::default()
        };
        let profile = ProviderQuote {
            current_price: Some(182.25),
            regular_market_price: Some(170.0),
            previous_close: Some(180.0),
            beta: Some(1.7),
            short_name: Some("NVIDIA".into()),
            sector: Some("Technology".into()),
        };

        let merged = merge_profile(chart, profile);
        assert_eq!(merged.current_price, Some(182.25));
        assert_eq!(merged.regular_market_price, Some(181.5));
        assert_eq!(merged.previous_close, Some(180.0));
        assert_eq!(merged.beta, Some(1.7));
        assert_eq!(merged.short_name.as_deref(), Some("NVIDIA Corporation"));
        assert_eq!(merged.sector.as_deref(), Some("Technology"));
    }

    #[test]
    fn client_takes_profile_settings_from_config() {
        let mut config = crate::config::AppConfig::default().quote;
        config.base_url = "https://quotes.test/".to_string();
        config.enrich_profile = false;

        let client = YahooClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://quotes.test");
        assert!(!client.enrich_profile);
        assert_eq!(client.cookie_url, "https://fc.yahoo.com");
    }

    #[test]
    fn parses_nested_modules() {
        let json = r#"{
            "quoteSummary": {
                "result": [{
                    "price": {"regularMarketPrice": {"raw": 181.5, "fmt": "181.50"}, "shortName": "NVIDIA Corporation"},
                    "summaryDetail": {"previousClose": {"raw": 180.0}, "beta": {"raw": 1.7}},
                    "financialData": {"currentPrice": {"raw": 182.25}},
                    "assetProfile": {"sector": "Technology"}
                }],
                "error": null
            }
        }"#;
        let body: SummaryResponse = serde_json::from_str(json).unwrap();
        let quote = YahooClient::parse_summary("NVDA", body).unwrap();

        assert_eq!(quote.current_price, Some(182.25));
        assert_eq!(quote.regular_market_price, Some(181.5));
        assert_eq!(quote.previous_close, Some(180.0));
        assert_eq!(quote.beta, Some(1.7));
        assert_eq!(quote.short_name.as_deref(), Some("NVIDIA Corporation"));
        assert_eq!(quote.sector.as_deref(), Some("Technology"));
    }

    #[test]
    fn etf_without_profile_or_financials() {
        let json = r#"{"quoteSummary": {"result": [{
            "price": {"regularMarketPrice": {"raw": 60.0}, "shortName": "ProShares UltraPro QQQ"},
            "summaryDetail": {"previousClose": {}}
        }], "error": null}}"#;
        let body: SummaryResponse = serde_json::from_str(json).unwrap();
        let quote = YahooClient::parse_summary("TQQQ", body).unwrap();

        assert_eq!(quote.current_price, None);
        assert_eq!(quote.regular_market_price, Some(60.0));
        assert_eq!(quote.previous_close, None);
        assert_eq!(quote.sector, None);
    }

    #[test]
    fn provider_error_is_quote_unavailable() {
        let json = r#"{"quoteSummary": {"result": null,
            "error": {"code": "Not Found", "description": "Quote not found for symbol: ZZZZ"}}}"#;
        let body: SummaryResponse = serde_json::from_str(json).unwrap();
        let err = YahooClient::parse_summary("ZZZZ", body).unwrap_err();
        assert!(matches!(err, DashboardError::QuoteUnavailable(ref m) if m.contains("Not Found")));
    }

    #[test]
    fn empty_result_is_quote_unavailable() {
        let json = r#"{"quoteSummary": {"result": [], "error": null}}"#;
        let body: SummaryResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            YahooClient::parse_summary("ZZZZ", body),
            Err(DashboardError::QuoteUnavailable(_))
        ));
    }
}
