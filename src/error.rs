use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("Index {index} is out of range for {len} positions")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Value {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange { value: String, min: String, max: String },

    #[error("Value must not be negative: {0}")]
    Negative(String),

    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Persisted portfolio is corrupt: {0}")]
    PersistenceCorrupt(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DashboardError::QuoteUnavailable(format!("Request timeout: {}", err))
        } else if err.is_connect() {
            DashboardError::QuoteUnavailable(format!("Connection error: {}", err))
        } else if err.is_decode() {
            DashboardError::QuoteUnavailable(format!("Malformed quote response: {}", err))
        } else {
            DashboardError::QuoteUnavailable(format!("HTTP error: {}", err))
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::PersistenceCorrupt(format!("JSON parsing error: {}", err))
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// Turns failures into the notices shown to the user.
pub struct ErrorHandler;

impl ErrorHandler {
    /// Log error and return a user-friendly message
    pub fn handle_error(error: &DashboardError) -> String {
        match error {
            DashboardError::InvalidInput(msg) => {
                tracing::warn!("Rejected input: {}", msg);
                format!("Invalid input: {}", msg)
            }
            DashboardError::QuoteUnavailable(msg) => {
                tracing::error!("Quote lookup failed: {}", msg);
                format!("Could not fetch quote data: {}", msg)
            }
            DashboardError::IndexOutOfRange { index, len } => {
                tracing::warn!("Index {} out of range ({} positions)", index, len);
                format!("No position at row {} (portfolio has {} rows)", index, len)
            }
            DashboardError::OutOfRange { value, min, max } => {
                tracing::warn!("Value {} outside [{}, {}]", value, min, max);
                format!("{} must be between {} and {}", value, min, max)
            }
            DashboardError::Negative(msg) => {
                tracing::warn!("Negative value rejected: {}", msg);
                format!("Value must not be negative: {}", msg)
            }
            DashboardError::PersistenceUnavailable(msg) => {
                tracing::error!("Portfolio could not be saved: {}", msg);
                format!("Changes were not saved and will be lost on restart: {}", msg)
            }
            DashboardError::PersistenceCorrupt(msg) => {
                tracing::warn!("Saved portfolio unreadable: {}", msg);
                format!("Saved portfolio could not be read, starting empty: {}", msg)
            }
            DashboardError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                format!("Configuration error: {}", msg)
            }
        }
    }

    /// True when the failure came from what the user typed rather than the environment.
    pub fn is_user_error(error: &DashboardError) -> bool {
        matches!(
            error,
            DashboardError::InvalidInput(_)
                | DashboardError::IndexOutOfRange { .. }
                | DashboardError::OutOfRange { .. }
                | DashboardError::Negative(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_are_distinguished_from_environment_failures() {
        assert!(ErrorHandler::is_user_error(&DashboardError::Negative("-1".into())));
        assert!(ErrorHandler::is_user_error(&DashboardError::IndexOutOfRange { index: 3, len: 1 }));
        assert!(!ErrorHandler::is_user_error(&DashboardError::QuoteUnavailable("down".into())));
        assert!(!ErrorHandler::is_user_error(&DashboardError::PersistenceUnavailable("ro".into())));
    }

    #[test]
    fn notice_mentions_the_offending_row() {
        let msg = ErrorHandler::handle_error(&DashboardError::IndexOutOfRange { index: 5, len: 2 });
        assert!(msg.contains("row 5"));
        assert!(msg.contains("2 rows"));
    }
}
