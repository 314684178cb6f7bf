use crate::{
    data::{Portfolio, Position},
    error::{DashboardError, DashboardResult},
};
use rust_decimal::Decimal;
use tracing::{info, warn};

pub fn min_beta() -> Decimal {
    Decimal::new(-5, 0)
}

pub fn max_beta() -> Decimal {
    Decimal::new(5, 0)
}

pub fn validate_beta(value: Decimal) -> DashboardResult<Decimal> {
    if value < min_beta() || value > max_beta() {
        return Err(DashboardError::OutOfRange {
            value: value.to_string(),
            min: min_beta().to_string(),
            max: max_beta().to_string(),
        });
    }
    Ok(value)
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Stock value plus cash, or `None` once any product or sum leaves `Decimal` range.
    pub fn checked_total(&self) -> Option<Decimal> {
        self.positions
            .iter()
            .try_fold(self.cash_balance, |acc, p| acc.checked_add(p.checked_market_value()?))
    }

    pub fn add(&mut self, position: Position) -> DashboardResult<()> {
        let fits = position
            .checked_market_value()
            .zip(self.checked_total())
            .and_then(|(value, total)| total.checked_add(value))
            .is_some();
        if !fits {
            return Err(DashboardError::InvalidInput(format!(
                "{} x {} @ {} is too large to value",
                position.shares, position.ticker, position.price
            )));
        }

        info!(
            "Adding {} x {} @ {} (beta {})",
            position.shares, position.ticker, position.price, position.beta
        );
        self.positions.push(position);
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> DashboardResult<Position> {
        if index >= self.positions.len() {
            return Err(DashboardError::IndexOutOfRange {
                index,
                len: self.positions.len(),
            });
        }

        let removed = self.positions.remove(index);
        info!("Removed position {} at row {}", removed.ticker, index);
        Ok(removed)
    }

    pub fn set_beta(&mut self, index: usize, value: Decimal) -> DashboardResult<()> {
        let value = validate_beta(value)?;
        let len = self.positions.len();
        let position = self
            .positions
            .get_mut(index)
            .ok_or(DashboardError::IndexOutOfRange { index, len })?;

        info!("Beta for {} changed {} -> {}", position.ticker, position.beta, value);
        position.beta = value;
        Ok(())
    }

    pub fn set_cash(&mut self, value: Decimal) -> DashboardResult<()> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DashboardError::Negative(value.to_string()));
        }

        let previous = std::mem::replace(&mut self.cash_balance, value);
        if self.checked_total().is_none() {
            self.cash_balance = previous;
            return Err(DashboardError::InvalidInput(format!(
                "Cash balance {} is too large to add to the portfolio",
                value
            )));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        info!("Clearing {} positions and cash balance", self.positions.len());
        self.positions.clear();
        self.cash_balance = Decimal::ZERO;
    }

    pub fn serialize(&self) -> DashboardResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Strict parse: the document must decode and its totals must be representable.
    pub fn parse(doc: &str) -> DashboardResult<Self> {
        let portfolio: Portfolio = serde_json::from_str(doc)?;
        if portfolio.checked_total().is_none() {
            return Err(DashboardError::PersistenceCorrupt(
                "portfolio values overflow when totalled".to_string(),
            ));
        }
        Ok(portfolio)
    }

    /// Never fails: anything unreadable comes back as an empty portfolio.
    pub fn deserialize(doc: &str) -> Self {
        match Self::parse(doc) {
            Ok(portfolio) => portfolio,
            Err(e) => {
                warn!("Discarding malformed portfolio document: {}", e);
                Self::default()
            }
        }
    }
}
