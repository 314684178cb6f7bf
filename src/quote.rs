use rust_decimal::prelude::*;
use tracing::{info, warn};

use crate::data::{ResolvedQuote, UNKNOWN_SECTOR};
use crate::error::{DashboardError, DashboardResult};
use crate::position_manager::{max_beta, min_beta};
use crate::rest_client::{ProviderQuote, QuoteProvider};

/// Curated betas for leveraged/inverse funds and a few large caps, in hundredths.
const KNOWN_BETAS: &[(&str, i64)] = &[
    // 3x bull
    ("TQQQ", 298),
    ("UPRO", 295),
    ("TECL", 297),
    ("SOXL", 315),
    ("FAS", 288),
    ("TNA", 292),
    ("LABU", 305),
    ("NUGT", 320),
    // 3x bear
    ("SQQQ", -298),
    ("SPXU", -295),
    ("TECS", -297),
    ("SOXS", -315),
    ("FAZ", -288),
    ("TZA", -292),
    // 2x
    ("QLD", 200),
    ("SSO", 198),
    ("UWM", 195),
    // broad market
    ("QQQ", 105),
    ("SPY", 100),
    ("IWM", 115),
    ("DIA", 95),
    ("VTI", 100),
    ("VOO", 100),
    ("AGG", 5),
    ("TLT", -15),
    ("GLD", 10),
    // large caps
    ("NVDA", 168),
    ("TSLA", 229),
    ("META", 118),
    ("AAPL", 124),
    ("MSFT", 89),
    ("GOOGL", 105),
    ("AMZN", 115),
    ("NFLX", 135),
    ("AMD", 182),
    ("INTC", 78),
];

pub fn known_beta(ticker: &str) -> Option<Decimal> {
    KNOWN_BETAS
        .iter()
        .find(|(symbol, _)| *symbol == ticker)
        .map(|(_, hundredths)| Decimal::new(*hundredths, 2))
}

pub fn normalize_ticker(raw: &str) -> DashboardResult<String> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(DashboardError::InvalidInput("ticker must not be empty".to_string()));
    }
    if ticker.chars().any(char::is_whitespace) {
        return Err(DashboardError::InvalidInput(format!("ticker '{}' contains whitespace", ticker)));
    }
    Ok(ticker)
}

fn to_decimal(value: f64) -> Option<Decimal> {
    if value.is_finite() {
        Decimal::from_f64(value)
    } else {
        None
    }
}

/// Turns raw provider fields into a quote following the fallback order.
pub fn build_quote(ticker: &str, raw: ProviderQuote) -> ResolvedQuote {
    let price = [raw.current_price, raw.regular_market_price, raw.previous_close]
        .into_iter()
        .flatten()
        .filter(|p| *p > 0.0)
        .find_map(to_decimal)
        .unwrap_or(Decimal::ZERO);

    let beta = match known_beta(ticker) {
        Some(b) => b,
        None => raw.beta.and_then(to_decimal).unwrap_or(Decimal::ONE),
    };
    let clamped = beta.clamp(min_beta(), max_beta());
    if clamped != beta {
        warn!("Beta {} for {} outside range, clamped to {}", beta, ticker, clamped);
    }

    ResolvedQuote {
        ticker: ticker.to_string(),
        price,
        beta: clamped,
        name: raw
            .short_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| ticker.to_string()),
        sector: raw
            .sector
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SECTOR.to_string()),
    }
}

pub struct QuoteResolver<P: QuoteProvider> {
    pub provider: P,
}

impl<P: QuoteProvider> QuoteResolver<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub async fn resolve(&self, ticker: &str) -> DashboardResult<ResolvedQuote> {
        let ticker = normalize_ticker(ticker)?;
        let raw = self.provider.fetch_quote(&ticker).await?;
        let quote = build_quote(&ticker, raw);

        info!(
            "Resolved {} ({}): price {} beta {} sector {}",
            quote.ticker, quote.name, quote.price, quote.beta, quote.sector
        );
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_table_lookups() {
        assert_eq!(known_beta("TQQQ"), Some(Decimal::new(298, 2)));
        assert_eq!(known_beta("SQQQ"), Some(Decimal::new(-298, 2)));
        assert_eq!(known_beta("TLT"), Some(Decimal::new(-15, 2)));
        assert_eq!(known_beta("tqqq"), None);
        assert_eq!(known_beta("ZZZZ"), None);
    }

    #[test]
    fn normalize_uppercases_and_trims() {
        assert_eq!(normalize_ticker("  aapl ").unwrap(), "AAPL");
        assert!(matches!(normalize_ticker("   "), Err(DashboardError::InvalidInput(_))));
        assert!(matches!(normalize_ticker("BRK B"), Err(DashboardError::InvalidInput(_))));
    }

    #[test]
    fn override_beats_provider_beta() {
        let raw = ProviderQuote {
            regular_market_price: Some(60.0),
            beta: Some(1.1),
            ..Default::default()
        };
        let q = build_quote("TQQQ", raw);
        assert_eq!(q.beta, Decimal::new(298, 2));
        assert_eq!(q.price, Decimal::new(60, 0));
    }

    #[test]
    fn price_falls_back_in_order() {
        let q = build_quote(
            "XYZ",
            ProviderQuote {
                current_price: Some(12.5),
                regular_market_price: Some(12.0),
                previous_close: Some(11.0),
                ..Default::default()
            },
        );
        assert_eq!(q.price, Decimal::new(125, 1));

        let q = build_quote(
            "XYZ",
            ProviderQuote { previous_close: Some(11.0), ..Default::default() },
        );
        assert_eq!(q.price, Decimal::new(11, 0));

        let q = build_quote("XYZ", ProviderQuote::default());
        assert_eq!(q.price, Decimal::ZERO);
    }

    #[test]
    fn zero_current_price_falls_through() {
        let q = build_quote(
            "XYZ",
            ProviderQuote {
                current_price: Some(0.0),
                regular_market_price: Some(7.0),
                ..Default::default()
            },
        );
        assert_eq!(q.price, Decimal::new(7, 0));
    }

    #[test]
    fn defaults_for_missing_fields() {
        let q = build_quote("XYZ", ProviderQuote::default());
        assert_eq!(q.beta, Decimal::ONE);
        assert_eq!(q.name, "XYZ");
        assert_eq!(q.sector, "Unknown");
    }

    #[test]
    fn provider_beta_used_and_clamped() {
        let q = build_quote("XYZ", ProviderQuote { beta: Some(1.37), ..Default::default() });
        assert_eq!(q.beta, Decimal::new(137, 2));

        let q = build_quote("XYZ", ProviderQuote { beta: Some(9.4), ..Default::default() });
        assert_eq!(q.beta, Decimal::new(5, 0));

        let q = build_quote("XYZ", ProviderQuote { beta: Some(f64::NAN), ..Default::default() });
        assert_eq!(q.beta, Decimal::ONE);
    }
}
