use crate::data::{
    GaugeBand, Portfolio, PortfolioSummary, PositionRow, RiskLevel, Severity,
};
use rust_decimal::Decimal;

/// Total market value of all positions, cash excluded.
/// Saturates rather than panicking on documents that bypassed `Portfolio` checks.
pub fn stock_value(portfolio: &Portfolio) -> Decimal {
    portfolio
        .positions
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.market_value()))
}

pub fn total_assets(portfolio: &Portfolio) -> Decimal {
    stock_value(portfolio).saturating_add(portfolio.cash_balance)
}

/// Each position's share of stock value, in row order. All zeros when nothing is priced.
pub fn weights(portfolio: &Portfolio) -> Vec<Decimal> {
    let total = stock_value(portfolio);
    portfolio
        .positions
        .iter()
        .map(|p| {
            if total.is_zero() {
                Decimal::ZERO
            } else {
                p.market_value() / total
            }
        })
        .collect()
}

/// Value-weighted beta of the stock positions. Zero when total stock value is zero.
pub fn compute_beta(portfolio: &Portfolio) -> Decimal {
    let total = stock_value(portfolio);
    if total.is_zero() {
        return Decimal::ZERO;
    }

    portfolio
        .positions
        .iter()
        .map(|p| (p.market_value() / total) * p.beta)
        .sum()
}

pub fn classify_risk(beta: Decimal) -> RiskLevel {
    let magnitude = beta.abs();
    if magnitude < Decimal::new(8, 1) {
        RiskLevel { label: "Low Risk", severity: Severity::Low }
    } else if magnitude < Decimal::new(12, 1) {
        RiskLevel { label: "Neutral Risk", severity: Severity::Medium }
    } else if magnitude < Decimal::new(2, 0) {
        RiskLevel { label: "Higher Risk", severity: Severity::Medium }
    } else {
        RiskLevel { label: "High Risk", severity: Severity::High }
    }
}

pub fn summarize(portfolio: &Portfolio) -> PortfolioSummary {
    let stock_value = stock_value(portfolio);
    let portfolio_beta = compute_beta(portfolio);
    let hundred = Decimal::ONE_HUNDRED;

    let rows = portfolio
        .positions
        .iter()
        .zip(weights(portfolio))
        .enumerate()
        .map(|(index, (p, weight))| PositionRow {
            index,
            ticker: p.ticker.clone(),
            name: p.name.clone(),
            shares: p.shares,
            price: p.price,
            market_value: p.market_value(),
            weight_pct: weight * hundred,
            beta: p.beta,
            sector: p.sector.clone(),
        })
        .collect();

    PortfolioSummary {
        portfolio_beta,
        risk: classify_risk(portfolio_beta),
        stock_value,
        total_assets: stock_value.saturating_add(portfolio.cash_balance),
        rows,
    }
}

// Dial scale and bands.
pub const GAUGE_MIN: Decimal = Decimal::from_parts(3, 0, 0, true, 0);
pub const GAUGE_MAX: Decimal = Decimal::from_parts(3, 0, 0, false, 0);
pub const GAUGE_REFERENCE: Decimal = Decimal::ONE;

const RED: &str = "#ef4444";
const AMBER: &str = "#f59e0b";
const YELLOW: &str = "#fbbf24";
const GREEN: &str = "#10b981";

pub fn gauge_bands() -> [GaugeBand; 7] {
    [
        GaugeBand { from: Decimal::new(-3, 0), to: Decimal::new(-2, 0), color: RED },
        GaugeBand { from: Decimal::new(-2, 0), to: Decimal::new(-1, 0), color: AMBER },
        GaugeBand { from: Decimal::new(-1, 0), to: Decimal::ZERO, color: YELLOW },
        GaugeBand { from: Decimal::ZERO, to: Decimal::new(8, 1), color: GREEN },
        GaugeBand { from: Decimal::new(8, 1), to: Decimal::new(12, 1), color: YELLOW },
        GaugeBand { from: Decimal::new(12, 1), to: Decimal::new(2, 0), color: AMBER },
        GaugeBand { from: Decimal::new(2, 0), to: Decimal::new(3, 0), color: RED },
    ]
}

/// Band the dial needle sits in. Betas past the scale pin to the outermost band.
pub fn gauge_band(beta: Decimal) -> GaugeBand {
    let needle = beta.clamp(GAUGE_MIN, GAUGE_MAX);
    let bands = gauge_bands();
    bands
        .iter()
        .copied()
        .find(|b| needle >= b.from && needle < b.to)
        .unwrap_or(bands[bands.len() - 1])
}
