use rust_decimal::Decimal;
use tracing::info;

use crate::{
    data::{Portfolio, PortfolioSummary},
    error::{DashboardError, DashboardResult},
    position_manager::validate_beta,
    quote::QuoteResolver,
    rest_client::QuoteProvider,
    risk_manager,
    store::PortfolioStore,
};

/// Outcome of the save that follows every mutation.
#[derive(Debug)]
pub enum SaveStatus {
    Saved,
    /// The change is live in memory but will not survive a restart.
    Unsaved(DashboardError),
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved)
    }
}

/// Drives one user session: resolve, mutate, persist, recompute.
pub struct Dashboard<P: QuoteProvider> {
    pub resolver: QuoteResolver<P>,
    pub store: PortfolioStore,
}

impl<P: QuoteProvider> Dashboard<P> {
    pub fn new(provider: P, store: PortfolioStore) -> Self {
        Self {
            resolver: QuoteResolver::new(provider),
            store,
        }
    }

    pub fn load(&self) -> Portfolio {
        self.store.load()
    }

    fn persist(&self, portfolio: &Portfolio) -> SaveStatus {
        match self.store.save(portfolio) {
            Ok(()) => SaveStatus::Saved,
            Err(e) => SaveStatus::Unsaved(e),
        }
    }

    pub async fn add_position(
        &self,
        portfolio: &mut Portfolio,
        ticker: &str,
        shares: u64,
        beta_override: Option<Decimal>,
    ) -> DashboardResult<SaveStatus> {
        let beta_override = beta_override.map(validate_beta).transpose()?;

        let quote = self.resolver.resolve(ticker).await?;
        let mut position = quote.into_position(shares);
        if let Some(beta) = beta_override {
            info!("Using user beta {} for {} instead of {}", beta, position.ticker, position.beta);
            position.beta = beta;
        }

        portfolio.add(position)?;
        Ok(self.persist(portfolio))
    }

    pub fn remove_position(&self, portfolio: &mut Portfolio, index: usize) -> DashboardResult<SaveStatus> {
        portfolio.remove_at(index)?;
        Ok(self.persist(portfolio))
    }

    pub fn edit_beta(&self, portfolio: &mut Portfolio, index: usize, beta: Decimal) -> DashboardResult<SaveStatus> {
        portfolio.set_beta(index, beta)?;
        Ok(self.persist(portfolio))
    }

    pub fn set_cash(&self, portfolio: &mut Portfolio, amount: Decimal) -> DashboardResult<SaveStatus> {
        portfolio.set_cash(amount)?;
        Ok(self.persist(portfolio))
    }

    pub fn reset(&self, portfolio: &mut Portfolio) -> SaveStatus {
        portfolio.clear();
        self.persist(portfolio)
    }

    pub fn summary(&self, portfolio: &Portfolio) -> PortfolioSummary {
        risk_manager::summarize(portfolio)
    }
}
