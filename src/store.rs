use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::data::Portfolio;
use crate::error::{DashboardError, DashboardResult};

/// Whole-document JSON persistence for a single portfolio file.
pub struct PortfolioStore {
    pub path: PathBuf,
    pub atomic_replace: bool,
}

impl PortfolioStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            atomic_replace: false,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            path: PathBuf::from(&config.path),
            atomic_replace: config.atomic_writes,
        }
    }

    pub fn save(&self, portfolio: &Portfolio) -> DashboardResult<()> {
        let doc = portfolio
            .serialize()
            .map_err(|e| DashboardError::PersistenceUnavailable(e.to_string()))?;

        if self.atomic_replace {
            self.write_atomic(&doc)?;
        } else {
            fs::write(&self.path, doc).map_err(|e| {
                DashboardError::PersistenceUnavailable(format!(
                    "Failed to write {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        }

        debug!(
            "Saved {} positions to {}",
            portfolio.positions.len(),
            self.path.display()
        );
        Ok(())
    }

    fn write_atomic(&self, doc: &str) -> DashboardResult<()> {
        let tmp = temp_path(&self.path);
        fs::write(&tmp, doc)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|e| {
                let _ = fs::remove_file(&tmp);
                DashboardError::PersistenceUnavailable(format!(
                    "Failed to replace {}: {}",
                    self.path.display(),
                    e
                ))
            })
    }

    /// Reads the saved portfolio. Missing or unreadable files give an empty one.
    pub fn load(&self) -> Portfolio {
        match self.try_load() {
            Ok(portfolio) => {
                info!(
                    "Loaded {} positions from {}",
                    portfolio.positions.len(),
                    self.path.display()
                );
                portfolio
            }
            Err(e) => {
                warn!("Starting with an empty portfolio: {}", e);
                Portfolio::default()
            }
        }
    }

    fn try_load(&self) -> DashboardResult<Portfolio> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DashboardError::PersistenceCorrupt(format!(
                    "{} does not exist yet",
                    self.path.display()
                )))
            }
            Err(e) => {
                return Err(DashboardError::PersistenceCorrupt(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        Portfolio::parse(&content)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
