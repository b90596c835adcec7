use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use super::locator::DetectionMethod;
use super::registry::{PlatformRegistry, UninstallEntry};
use super::validator::PathValidator;
use crate::core::config::GameConfig;

/// A single way of finding the game. `None` means "inconclusive", the
/// locator then tries the next strategy.
pub trait Detector: Send + Sync {
    fn detect(&self, validator: &PathValidator) -> Option<PathBuf>;
}

/// Conventional Steam library locations, probed as-is.
pub struct FixedPathProbe {
    paths: Vec<PathBuf>,
}

impl FixedPathProbe {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl Detector for FixedPathProbe {
    fn detect(&self, validator: &PathValidator) -> Option<PathBuf> {
        self.paths
            .iter()
            .find(|path| validator.is_valid_installation(path))
            .cloned()
    }
}

/// `<steam root>/steamapps/common/<game folder>` using the root the Steam
/// client recorded for itself.
pub struct SteamLibraryProbe {
    registry: Arc<dyn PlatformRegistry>,
    subpath: PathBuf,
    folder_name: String,
}

impl SteamLibraryProbe {
    pub fn new(registry: Arc<dyn PlatformRegistry>, subpath: PathBuf, folder_name: String) -> Self {
        Self {
            registry,
            subpath,
            folder_name,
        }
    }
}

impl Detector for SteamLibraryProbe {
    fn detect(&self, validator: &PathValidator) -> Option<PathBuf> {
        let Some(root) = self.registry.installed_library_root() else {
            debug!("Steam library root not recorded");
            return None;
        };

        let candidate = root.join(&self.subpath).join(&self.folder_name);
        validator
            .is_valid_installation(&candidate)
            .then_some(candidate)
    }
}

/// Uninstall entries whose name mentions both keywords, checked root by
/// root; the first root with a valid install location wins.
pub struct UninstallSearch {
    registry: Arc<dyn PlatformRegistry>,
    roots: Vec<String>,
    keywords: [String; 2],
}

impl UninstallSearch {
    pub fn new(registry: Arc<dyn PlatformRegistry>, roots: Vec<String>, keywords: [String; 2]) -> Self {
        let keywords = keywords.map(|keyword| keyword.to_lowercase());
        Self {
            registry,
            roots,
            keywords,
        }
    }

    fn matches(&self, entry: &UninstallEntry) -> bool {
        let label = entry.label().to_lowercase();
        self.keywords.iter().all(|keyword| label.contains(keyword.as_str()))
    }
}

impl Detector for UninstallSearch {
    fn detect(&self, validator: &PathValidator) -> Option<PathBuf> {
        let predicate = |entry: &UninstallEntry| self.matches(entry);

        for root in &self.roots {
            let candidates = self.registry.search_uninstall_entries(root, &predicate);
            debug!("{} uninstall candidates under {}", candidates.len(), root);

            let found = candidates
                .into_iter()
                .filter_map(|entry| entry.install_location)
                .find(|location| validator.is_valid_installation(location));
            if found.is_some() {
                return found;
            }
        }

        None
    }
}

/// Dispatcher over the built-in strategies, in priority order.
pub enum Strategy {
    FixedPaths(FixedPathProbe),
    SteamLibrary(SteamLibraryProbe),
    UninstallRegistry(UninstallSearch),
}

impl Strategy {
    /// The default strategy list: cheap static paths first, registry
    /// enumeration last.
    pub fn defaults(config: &GameConfig, registry: Arc<dyn PlatformRegistry>) -> Vec<Strategy> {
        vec![
            Strategy::FixedPaths(FixedPathProbe::new(config.fixed_paths.clone())),
            Strategy::SteamLibrary(SteamLibraryProbe::new(
                registry.clone(),
                config.steam_subpath.clone(),
                config.folder_name.clone(),
            )),
            Strategy::UninstallRegistry(UninstallSearch::new(
                registry,
                config.uninstall_roots.clone(),
                config.name_keywords.clone(),
            )),
        ]
    }

    pub fn method(&self) -> DetectionMethod {
        match self {
            Strategy::FixedPaths(_) => DetectionMethod::SteamFixedPath,
            Strategy::SteamLibrary(_) => DetectionMethod::SteamLibrary,
            Strategy::UninstallRegistry(_) => DetectionMethod::UninstallRegistry,
        }
    }

    pub fn detect(&self, validator: &PathValidator) -> Option<PathBuf> {
        match self {
            Strategy::FixedPaths(s) => s.detect(validator),
            Strategy::SteamLibrary(s) => s.detect(validator),
            Strategy::UninstallRegistry(s) => s.detect(validator),
        }
    }
}
