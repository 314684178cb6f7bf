pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod logging;
pub mod position_manager;
pub mod quote;
pub mod rest_client;
pub mod risk_manager;
pub mod store;


pub use data::{Portfolio, PortfolioSummary, Position, RiskLevel, Severity};
pub use engine::{Dashboard, SaveStatus};
pub use error::{DashboardError, DashboardResult, ErrorHandler};
