use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::registry::PlatformRegistry;
use super::strategies::Strategy;
use super::validator::PathValidator;
use crate::core::config::GameConfig;

/// Which heuristic produced an [`InstallationTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    SteamFixedPath,
    SteamLibrary,
    UninstallRegistry,
    Manual,
}

/// A directory validated as a game installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationTarget {
    pub path: PathBuf,
    pub method: DetectionMethod,
}

pub struct InstallationLocator {
    validator: PathValidator,
    strategies: Vec<Strategy>,
}

impl InstallationLocator {
    pub fn new(validator: PathValidator, strategies: Vec<Strategy>) -> Self {
        Self {
            validator,
            strategies,
        }
    }

    pub fn from_config(config: &GameConfig, registry: Arc<dyn PlatformRegistry>) -> Self {
        Self::new(
            PathValidator::new(config.executables.clone()),
            Strategy::defaults(config, registry),
        )
    }

    /// Runs the strategies in order; the first valid directory wins.
    /// `None` leaves the manual pick to the UI.
    #[instrument(skip(self))]
    pub fn locate(&self) -> Option<InstallationTarget> {
        for strategy in &self.strategies {
            let method = strategy.method();
            match strategy.detect(&self.validator) {
                Some(path) => {
                    info!("Game found via {:?} at {:?}", method, path);
                    return Some(InstallationTarget { path, method });
                }
                None => debug!("Strategy {:?} inconclusive", method),
            }
        }

        info!("Game installation not detected automatically");
        None
    }

    /// Validates a directory the user picked by hand.
    pub fn validate_manual(&self, path: &Path) -> Option<InstallationTarget> {
        self.validator
            .is_valid_installation(path)
            .then(|| InstallationTarget {
                path: path.to_path_buf(),
                method: DetectionMethod::Manual,
            })
    }
}
