use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument};

use super::download::{download_bytes, FetchedAsset, Upstream};
use crate::core::config::ReleaseSourceConfig;
use crate::core::error::{InstallerError, InstallerResult};

/// GitHub release metadata, reduced to what the installer reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    pub browser_download_url: String,
}

/// First asset that names the platform or looks like an executable or a
/// ZIP archive.
pub fn select_asset<'a>(assets: &'a [ReleaseAsset], platform_marker: &str) -> Option<&'a ReleaseAsset> {
    let marker = platform_marker.to_lowercase();
    assets.iter().find(|asset| {
        let name = asset.name.to_lowercase();
        name.contains(&marker) || name.ends_with(".exe") || name.ends_with(".zip")
    })
}

pub struct ReleaseFetcher {
    client: Client,
    config: ReleaseSourceConfig,
}

impl ReleaseFetcher {
    pub fn new(client: Client, config: ReleaseSourceConfig) -> Self {
        Self { client, config }
    }

    pub async fn fetch_release(&self) -> InstallerResult<Release> {
        let url = &self.config.api_url;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github.v3+json")
            .timeout(self.config.metadata_timeout())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Upstream::GitHub.status_error(url, status, None));
        }

        Ok(response.json::<Release>().await?)
    }

    /// Resolves the latest release and downloads its platform asset. The
    /// returned asset carries the release file name.
    #[instrument(skip(self))]
    pub async fn fetch_latest_manager_asset(&self) -> InstallerResult<FetchedAsset> {
        let release = self.fetch_release().await?;
        info!("Found SA Mod Manager {}", release.tag_name);

        let asset = select_asset(&release.assets, &self.config.platform_marker).ok_or_else(|| {
            InstallerError::NotFound(
                "Could not find Windows executable in GitHub releases".to_string(),
            )
        })?;

        info!(
            "Downloading {} ({} MB)",
            asset.name,
            (asset.size as f64 / 1024.0 / 1024.0).round()
        );

        let request = self
            .client
            .get(&asset.browser_download_url)
            .timeout(self.config.download_timeout());
        let mut fetched =
            download_bytes(request, &asset.browser_download_url, Upstream::GitHub, None).await?;
        fetched.name = Some(asset.name.clone());
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            size: 1,
            browser_download_url: format!("https://example.invalid/{name}"),
        }
    }

    #[test]
    fn picks_first_matching_asset() {
        let assets = vec![
            asset("checksums.txt"),
            asset("SAModManager-Windows-x64.7z"),
            asset("release.zip"),
        ];
        assert_eq!(
            select_asset(&assets, "windows").unwrap().name,
            "SAModManager-Windows-x64.7z"
        );

        let assets = vec![asset("notes.md"), asset("SAModManager.EXE")];
        assert_eq!(select_asset(&assets, "windows").unwrap().name, "SAModManager.EXE");
    }

    #[test]
    fn no_candidate_yields_none() {
        assert!(select_asset(&[asset("source.tar.gz")], "windows").is_none());
        assert!(select_asset(&[], "windows").is_none());
    }

    #[tokio::test]
    async fn missing_asset_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _release = server
            .mock("GET", "/releases/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"tag_name":"v1.0","assets":[{"name":"src.tar.gz","size":3,"browser_download_url":"http://x/src"}]}"#)
            .create_async()
            .await;

        let config = ReleaseSourceConfig {
            api_url: format!("{}/releases/latest", server.url()),
            ..ReleaseSourceConfig::default()
        };
        let err = ReleaseFetcher::new(Client::new(), config)
            .fetch_latest_manager_asset()
            .await
            .unwrap_err();
        assert!(matches!(err, InstallerError::NotFound(_)));
    }

    #[tokio::test]
    async fn rate_limit_maps_to_specific_error() {
        let mut server = mockito::Server::new_async().await;
        let _release = server
            .mock("GET", "/releases/latest")
            .with_status(403)
            .create_async()
            .await;

        let config = ReleaseSourceConfig {
            api_url: format!("{}/releases/latest", server.url()),
            ..ReleaseSourceConfig::default()
        };
        let err = ReleaseFetcher::new(Client::new(), config)
            .fetch_release()
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "GitHub API rate limit exceeded. Please try again later."
        );
    }

    #[tokio::test]
    async fn downloads_selected_asset_with_its_name() {
        let mut server = mockito::Server::new_async().await;
        let body = format!(
            r#"{{"tag_name":"v1.3.2","assets":[{{"name":"SAModManager.exe","size":4,"browser_download_url":"{}/dl/SAModManager.exe"}}]}}"#,
            server.url()
        );
        let _release = server
            .mock("GET", "/releases/latest")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
        let _binary = server
            .mock("GET", "/dl/SAModManager.exe")
            .with_status(200)
            .with_header("content-type", "application/octet-stream")
            .with_body("MZ01")
            .create_async()
            .await;

        let config = ReleaseSourceConfig {
            api_url: format!("{}/releases/latest", server.url()),
            ..ReleaseSourceConfig::default()
        };
        let asset = ReleaseFetcher::new(Client::new(), config)
            .fetch_latest_manager_asset()
            .await
            .unwrap();

        assert_eq!(asset.bytes, b"MZ01");
        assert_eq!(asset.name.as_deref(), Some("SAModManager.exe"));
        assert_eq!(asset.content_type.as_deref(), Some("application/octet-stream"));
    }
}
