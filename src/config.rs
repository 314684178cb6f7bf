use serde::{Deserialize, Serialize};
use std::env;
use crate::error::{DashboardError, DashboardResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64, // 0 = wait indefinitely
    #[serde(default = "default_cookie_url")]
    pub cookie_url: String,
    #[serde(default = "default_enrich_profile")]
    pub enrich_profile: bool,
}

fn default_cookie_url() -> String {
    "https://fc.yahoo.com".to_string()
}

fn default_enrich_profile() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: String,
    pub atomic_writes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub quote: QuoteConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            quote: QuoteConfig {
                base_url: "https://query2.finance.yahoo.com".to_string(),
                user_agent: "Mozilla/5.0 (compatible; beta-dashboard/0.1)".to_string(),
                timeout_secs: 0,
                cookie_url: default_cookie_url(),
                enrich_profile: default_enrich_profile(),
            },
            storage: StorageConfig {
                path: "portfolio_data.json".to_string(),
                atomic_writes: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> DashboardResult<Self> {
        dotenv::dotenv().ok();
        let mut config = Self::default();

        if let Ok(base_url) = env::var("QUOTE_BASE_URL") {
            config.quote.base_url = base_url;
        }

        if let Ok(user_agent) = env::var("QUOTE_USER_AGENT") {
            config.quote.user_agent = user_agent;
        }

        if let Ok(timeout) = env::var("QUOTE_TIMEOUT_SECS") {
            config.quote.timeout_secs = timeout.parse()
                .map_err(|_| DashboardError::Configuration("Invalid QUOTE_TIMEOUT_SECS".to_string()))?;
        }

        if let Ok(cookie_url) = env::var("QUOTE_COOKIE_URL") {
            config.quote.cookie_url = cookie_url;
        }

        if let Ok(enrich) = env::var("QUOTE_ENRICH_PROFILE") {
            config.quote.enrich_profile = enrich.parse()
                .map_err(|_| DashboardError::Configuration("Invalid QUOTE_ENRICH_PROFILE".to_string()))?;
        }

        if let Ok(path) = env::var("PORTFOLIO_PATH") {
            config.storage.path = path;
        }

        if let Ok(atomic) = env::var("PORTFOLIO_ATOMIC_WRITES") {
            config.storage.atomic_writes = atomic.parse()
                .map_err(|_| DashboardError::Configuration("Invalid PORTFOLIO_ATOMIC_WRITES".to_string()))?;
        }

        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.logging.level = log_level.to_lowercase();
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: &str) -> DashboardResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DashboardError::Configuration(format!("Failed to read config file: {}", e)))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| DashboardError::Configuration(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &str) -> DashboardResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DashboardError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| DashboardError::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> DashboardResult<()> {
        if self.quote.base_url.trim().is_empty() {
            return Err(DashboardError::Configuration("Quote base URL cannot be empty".to_string()));
        }

        if !self.quote.base_url.starts_with("http://") && !self.quote.base_url.starts_with("https://") {
            return Err(DashboardError::Configuration(format!("Quote base URL must be http(s): {}", self.quote.base_url)));
        }

        if self.quote.enrich_profile
            && !self.quote.cookie_url.starts_with("http://")
            && !self.quote.cookie_url.starts_with("https://")
        {
            return Err(DashboardError::Configuration(format!("Cookie URL must be http(s): {}", self.quote.cookie_url)));
        }

        if self.storage.path.trim().is_empty() {
            return Err(DashboardError::Configuration("Portfolio path cannot be empty".to_string()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(DashboardError::Configuration(format!("Invalid log level: {}", self.logging.level)));
        }

        Ok(())
    }
}
