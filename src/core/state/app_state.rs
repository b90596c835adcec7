use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::archive::Extractor;
use crate::core::catalog::Catalog;
use crate::core::config::InstallerConfig;
use crate::core::detection::{platform_registry, InstallationLocator, InstallationTarget, PlatformRegistry};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::http::build_http_client;
use crate::core::install::{InstallOutcome, InstallRequest, InstallationOrchestrator, ProgressSink};
use crate::core::sources::{PackageFetcher, PackageMetadata};

/// Everything the UI operations share for the lifetime of the process.
pub struct AppState {
    pub config: Arc<InstallerConfig>,
    pub catalog: Arc<Catalog>,
    locator: Arc<InstallationLocator>,
    orchestrator: InstallationOrchestrator,
    packages: PackageFetcher,
    /// Held for the duration of one installation run.
    install_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: InstallerConfig) -> InstallerResult<Self> {
        let registry = platform_registry(&config.game);
        Self::with_parts(config, Catalog::builtin()?, registry)
    }

    pub fn with_parts(
        config: InstallerConfig,
        catalog: Catalog,
        registry: Arc<dyn PlatformRegistry>,
    ) -> InstallerResult<Self> {
        let client: Client = build_http_client(&config)?;
        let extractor = Extractor::from_config(&config);
        info!("Using 7-Zip helper at {:?}", extractor.seven_zip());

        let config = Arc::new(config);
        let catalog = Arc::new(catalog);
        let locator = Arc::new(InstallationLocator::from_config(&config.game, registry));
        let packages = PackageFetcher::new(client.clone(), config.packages.clone());
        let orchestrator =
            InstallationOrchestrator::new(config.clone(), catalog.clone(), client, extractor);

        Ok(Self {
            config,
            catalog,
            locator,
            orchestrator,
            packages,
            install_lock: Mutex::new(()),
        })
    }

    /// Automatic detection. Registry and filesystem probing run on the
    /// blocking pool.
    pub async fn detect(&self) -> Option<InstallationTarget> {
        let locator = self.locator.clone();
        match tokio::task::spawn_blocking(move || locator.locate()).await {
            Ok(found) => found,
            Err(err) => {
                warn!("Detection task failed: {}", err);
                None
            }
        }
    }

    pub async fn validate_path(&self, path: PathBuf) -> Option<InstallationTarget> {
        let locator = self.locator.clone();
        tokio::task::spawn_blocking(move || locator.validate_manual(&path))
            .await
            .ok()
            .flatten()
    }

    /// Runs one installation, refusing to start while another is active.
    pub async fn install(
        &self,
        request: &InstallRequest,
        progress: &dyn ProgressSink,
    ) -> InstallerResult<InstallOutcome> {
        let _guard = self
            .install_lock
            .try_lock()
            .map_err(|_| InstallerError::InstallInProgress)?;
        Ok(self.orchestrator.install(request, progress).await)
    }

    pub async fn inspect_package(&self, item_id: u64) -> InstallerResult<PackageMetadata> {
        self.packages.inspect(item_id).await
    }
}
