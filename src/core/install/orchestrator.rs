use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use super::progress::{percent, InstallPhase, ProgressEvent, ProgressSink};
use crate::core::archive::Extractor;
use crate::core::catalog::{Catalog, CatalogEntry};
use crate::core::config::InstallerConfig;
use crate::core::error::{ErrorKind, InstallerError, InstallerResult};
use crate::core::manager::{install_manager, launch_manager};
use crate::core::mods_ini::ModsIni;
use crate::core::sources::{PackageFetcher, ReleaseFetcher};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallRequest {
    pub game_dir: PathBuf,
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default)]
    pub open_manager_after: bool,
}

/// Terminal value of one run, as reported to the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl InstallOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(err: &InstallerError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }
}

/// Runs one installation: the mod manager first, then every add-on in the
/// batch, one at a time, then the generated `mods.ini`.
pub struct InstallationOrchestrator {
    config: Arc<InstallerConfig>,
    catalog: Arc<Catalog>,
    releases: ReleaseFetcher,
    packages: PackageFetcher,
    extractor: Extractor,
}

impl InstallationOrchestrator {
    pub fn new(
        config: Arc<InstallerConfig>,
        catalog: Arc<Catalog>,
        client: Client,
        extractor: Extractor,
    ) -> Self {
        let releases = ReleaseFetcher::new(client.clone(), config.release.clone());
        let packages = PackageFetcher::new(client, config.packages.clone());
        Self {
            config,
            catalog,
            releases,
            packages,
            extractor,
        }
    }

    /// Never fails; errors end up in the outcome.
    pub async fn install(&self, request: &InstallRequest, progress: &dyn ProgressSink) -> InstallOutcome {
        match self.run(request, progress).await {
            Ok(()) => InstallOutcome::ok(),
            Err(err) => {
                error!("Installation failed: {}", err);
                InstallOutcome::failed(&err)
            }
        }
    }

    /// The first failing step ends the run, add-ons included; whatever was
    /// extracted before it stays on disk.
    #[instrument(skip(self, request, progress), fields(game_dir = ?request.game_dir))]
    pub async fn run(&self, request: &InstallRequest, progress: &dyn ProgressSink) -> InstallerResult<()> {
        let game_dir = request.game_dir.as_path();
        let mods_dir = game_dir.join(&self.config.manager.mods_dir);
        tokio::fs::create_dir_all(&mods_dir)
            .await
            .map_err(|source| InstallerError::io(&mods_dir, source))?;

        progress.emit(ProgressEvent::new(
            InstallPhase::Downloading,
            "Downloading SA2 Mod Manager...",
            0,
        ));
        let manager_exe = self
            .install_manager(game_dir)
            .await
            .map_err(|source| InstallerError::ManagerDownload {
                source: Box::new(source),
            })?;

        let batch = self.catalog.installation_batch(&request.selected);
        let total = batch.len();
        let mut completed = 0;

        for id in &batch {
            let Some(entry) = self.catalog.get(id) else {
                debug!("Unknown catalog id {}, skipping", id);
                continue;
            };

            progress.emit(ProgressEvent::new(
                InstallPhase::Downloading,
                format!("Downloading {}...", entry.name),
                percent(completed, total),
            ));

            self.install_entry(entry, &mods_dir)
                .await
                .map_err(|source| InstallerError::PackageDownload {
                    name: entry.name.clone(),
                    source: Box::new(source),
                })?;

            completed += 1;
            progress.emit(ProgressEvent::new(
                InstallPhase::Installing,
                format!("Installed {}", entry.name),
                percent(completed, total),
            ));
        }

        progress.emit(ProgressEvent::new(
            InstallPhase::Configuring,
            "Configuring mods...",
            100,
        ));
        ModsIni::from_batch(&self.catalog, &batch)
            .write(&game_dir.join(&self.config.manager.config_file))
            .await?;

        if request.open_manager_after {
            if let Err(err) = launch_manager(&manager_exe) {
                warn!("Failed to open mod manager: {}", err);
            }
        }

        info!("Installed {} of {} batch entries", completed, total);
        Ok(())
    }

    async fn install_manager(&self, game_dir: &Path) -> InstallerResult<PathBuf> {
        let asset = self.releases.fetch_latest_manager_asset().await?;
        install_manager(asset, game_dir, &self.config.manager).await
    }

    async fn install_entry(&self, entry: &CatalogEntry, mods_dir: &Path) -> InstallerResult<()> {
        if entry.is_mod_loader() {
            info!("Skipping separate download for {}, included with mod manager", entry.name);
            return Ok(());
        }
        if entry.game_banana_id.is_none() {
            info!("No download method configured for {}, skipping", entry.name);
            return Ok(());
        }

        let classified = self.packages.fetch_item(entry).await?;
        let dest = mods_dir.join(&entry.id);
        self.extractor
            .extract(classified.asset.bytes, classified.kind, &dest)
            .await?;
        info!("Installed {} into {:?}", entry.name, dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mockito::Matcher;

    use super::*;
    use crate::core::archive::extract::tests::zip_bytes;
    use crate::core::config::{PackageSourceConfig, ReleaseSourceConfig};

    struct Upstreams {
        server: mockito::ServerGuard,
        mocks: Vec<mockito::Mock>,
    }

    impl Upstreams {
        async fn start() -> Self {
            let server = mockito::Server::new_async().await;
            Self {
                server,
                mocks: Vec::new(),
            }
        }

        fn config(&self) -> InstallerConfig {
            InstallerConfig {
                release: ReleaseSourceConfig {
                    api_url: format!("{}/releases/latest", self.server.url()),
                    ..ReleaseSourceConfig::default()
                },
                packages: PackageSourceConfig {
                    api_base: self.server.url(),
                    ..PackageSourceConfig::default()
                },
                ..InstallerConfig::default()
            }
        }

        async fn manager_release(&mut self) {
            let body = format!(
                r#"{{"tag_name":"v1.0","assets":[{{"name":"SAModManager.exe","size":2,"browser_download_url":"{}/dl/manager.exe"}}]}}"#,
                self.server.url()
            );
            let release = self
                .server
                .mock("GET", "/releases/latest")
                .with_status(200)
                .with_body(body)
                .create_async()
                .await;
            let binary = self
                .server
                .mock("GET", "/dl/manager.exe")
                .with_status(200)
                .with_body("MZ")
                .create_async()
                .await;
            self.mocks.extend([release, binary]);
        }

        async fn package(&mut self, id: u64, files: Option<Vec<u8>>, hits: usize) -> mockito::Mock {
            let meta_body = match files {
                Some(_) => format!(
                    r#"{{"_idRow":{id},"_aFiles":[{{"_sDownloadUrl":"{}/dl/{id}"}}]}}"#,
                    self.server.url()
                ),
                None => format!(r#"{{"_idRow":{id},"_aFiles":[]}}"#),
            };
            let meta = self
                .server
                .mock("GET", format!("/Mod/{id}").as_str())
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(meta_body)
                .create_async()
                .await;
            self.mocks.push(meta);

            self.server
                .mock("GET", format!("/dl/{id}").as_str())
                .with_status(200)
                .with_body(files.unwrap_or_default())
                .expect(hits)
                .create_async()
                .await
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CatalogEntry::new("loader", "Loader").required(),
            CatalogEntry::new("a", "Alpha").with_game_banana_id(1),
            CatalogEntry::new("b", "Bravo").with_game_banana_id(2),
            CatalogEntry::new("c", "Charlie").with_game_banana_id(3),
        ])
        .unwrap()
    }

    fn orchestrator(config: InstallerConfig) -> InstallationOrchestrator {
        InstallationOrchestrator::new(
            Arc::new(config),
            Arc::new(catalog()),
            Client::new(),
            Extractor::new(PathBuf::from("7z")),
        )
    }

    fn request(dir: &Path, selected: &[&str]) -> InstallRequest {
        InstallRequest {
            game_dir: dir.to_path_buf(),
            selected: selected.iter().map(|s| s.to_string()).collect(),
            open_manager_after: false,
        }
    }

    #[tokio::test]
    async fn required_entry_is_enabled_without_being_selected() {
        let mut upstreams = Upstreams::start().await;
        upstreams.manager_release().await;
        let _a = upstreams
            .package(1, Some(zip_bytes(&[("mod.ini", b"Name=Alpha".as_slice())])), 1)
            .await;

        let game = tempfile::tempdir().unwrap();
        let events = Mutex::new(Vec::new());
        let sink = |event: ProgressEvent| events.lock().unwrap().push(event);

        let outcome = orchestrator(upstreams.config())
            .install(&request(game.path(), &["a"]), &sink)
            .await;
        assert_eq!(outcome, InstallOutcome::ok());

        let ini = std::fs::read_to_string(game.path().join("mods.ini")).unwrap();
        assert_eq!(ModsIni::parse(&ini).enabled_ids(), vec!["loader", "a"]);
        assert_eq!(std::fs::read(game.path().join("SA2ModManager.exe")).unwrap(), b"MZ");
        assert!(game.path().join("mods").join("a").join("mod.ini").is_file());
        assert!(!game.path().join("mods").join("loader").exists());

        let seen: Vec<(InstallPhase, String, u8)> = events
            .into_inner()
            .unwrap()
            .into_iter()
            .map(|e| (e.phase, e.message, e.percent))
            .collect();
        assert_eq!(
            seen,
            vec![
                (InstallPhase::Downloading, "Downloading SA2 Mod Manager...".into(), 0),
                (InstallPhase::Downloading, "Downloading Loader...".into(), 0),
                (InstallPhase::Installing, "Installed Loader".into(), 50),
                (InstallPhase::Downloading, "Downloading Alpha...".into(), 50),
                (InstallPhase::Installing, "Installed Alpha".into(), 100),
                (InstallPhase::Configuring, "Configuring mods...".into(), 100),
            ]
        );
    }

    #[tokio::test]
    async fn failing_add_on_stops_the_batch() {
        let mut upstreams = Upstreams::start().await;
        upstreams.manager_release().await;
        let _a = upstreams
            .package(1, Some(zip_bytes(&[("alpha.txt", b"a".as_slice())])), 1)
            .await;
        let _b = upstreams.package(2, None, 0).await;
        let c_download = upstreams
            .package(3, Some(zip_bytes(&[("charlie.txt", b"c".as_slice())])), 0)
            .await;

        let game = tempfile::tempdir().unwrap();
        let sink = |_: ProgressEvent| {};
        let outcome = orchestrator(upstreams.config())
            .install(&request(game.path(), &["a", "b", "c"]), &sink)
            .await;

        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Failed to download Bravo: No download files available for Bravo")
        );
        assert_eq!(outcome.error_kind, Some(ErrorKind::NotFound));

        let mods = game.path().join("mods");
        assert!(mods.join("a").join("alpha.txt").is_file());
        assert!(!mods.join("c").exists());
        assert_eq!(
            std::fs::read_to_string(game.path().join("mods.ini")).unwrap(),
            crate::core::manager::DEFAULT_MODS_INI
        );
        c_download.assert_async().await;
    }

    #[tokio::test]
    async fn manager_failure_aborts_before_add_ons() {
        let mut upstreams = Upstreams::start().await;
        let release = upstreams
            .server
            .mock("GET", "/releases/latest")
            .with_status(200)
            .with_body(r#"{"tag_name":"v1.0","assets":[]}"#)
            .create_async()
            .await;
        upstreams.mocks.push(release);

        let game = tempfile::tempdir().unwrap();
        let sink = |_: ProgressEvent| {};
        let outcome = orchestrator(upstreams.config())
            .install(&request(game.path(), &["a"]), &sink)
            .await;

        assert_eq!(
            outcome.error.as_deref(),
            Some("Failed to download SA2 Mod Manager: Could not find Windows executable in GitHub releases")
        );
        assert!(game.path().join("mods").is_dir());
        assert!(!game.path().join("mods").join("a").exists());
    }
}
