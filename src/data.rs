use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_SECTOR: &str = "Unknown";

/// One held lot. Two lots of the same ticker stay separate rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub price: Decimal,
    pub beta: Decimal,
    pub name: String,
    pub sector: String,
    pub shares: u64,
}

impl Position {
    /// Pins at `Decimal::MAX` instead of overflowing.
    pub fn market_value(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.shares))
    }

    pub fn checked_market_value(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.shares))
    }
}

/// Session state owned by the caller and handed to every operation by reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(rename = "portfolio", default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub cash_balance: Decimal,
}

/// Result of a quote lookup, before shares are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuote {
    pub ticker: String,
    pub price: Decimal,
    pub beta: Decimal,
    pub name: String,
    pub sector: String,
}

impl ResolvedQuote {
    pub fn into_position(self, shares: u64) -> Position {
        Position {
            ticker: self.ticker,
            price: self.price,
            beta: self.beta,
            name: self.name,
            sector: self.sector,
            shares,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskLevel {
    pub label: &'static str,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionRow {
    pub index: usize,
    pub ticker: String,
    pub name: String,
    pub shares: u64,
    pub price: Decimal,
    pub market_value: Decimal,
    /// Percent of stock value, 0 when nothing is priced.
    pub weight_pct: Decimal,
    pub beta: Decimal,
    pub sector: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub portfolio_beta: Decimal,
    pub risk: RiskLevel,
    pub stock_value: Decimal,
    pub total_assets: Decimal,
    pub rows: Vec<PositionRow>,
}

/// One colored segment of the beta dial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeBand {
    pub from: Decimal,
    pub to: Decimal,
    pub color: &'static str,
}
