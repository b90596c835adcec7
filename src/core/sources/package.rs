use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::download::{download_bytes, FetchedAsset, ItemRef, Upstream};
use crate::core::archive::{classify, ArchiveKind};
use crate::core::catalog::CatalogEntry;
use crate::core::config::PackageSourceConfig;
use crate::core::error::{InstallerError, InstallerResult};

/// Per-item metadata as returned by the package host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(rename = "_idRow", default)]
    pub row_id: Option<u64>,
    #[serde(rename = "_sName", default)]
    pub name: Option<String>,
    #[serde(rename = "_aFiles", default)]
    pub files: Option<Vec<PackageFile>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageFile {
    #[serde(rename = "_sFile", default)]
    pub file_name: Option<String>,
    #[serde(rename = "_nFilesize", default)]
    pub size: Option<u64>,
    #[serde(rename = "_sDownloadUrl", default)]
    pub download_url: Option<String>,
}

impl PackageMetadata {
    /// Download URL of the first listed file, if any.
    pub fn first_download_url(&self) -> Option<&str> {
        self.files
            .as_ref()?
            .first()?
            .download_url
            .as_deref()
            .filter(|url| !url.is_empty())
    }
}

/// A downloaded package together with its sniffed container format. The
/// kind is always a supported one.
#[derive(Debug, Clone)]
pub struct ClassifiedAsset {
    pub asset: FetchedAsset,
    pub kind: ArchiveKind,
}

pub struct PackageFetcher {
    client: Client,
    config: PackageSourceConfig,
}

impl PackageFetcher {
    pub fn new(client: Client, config: PackageSourceConfig) -> Self {
        Self { client, config }
    }

    pub async fn fetch_metadata(
        &self,
        item: ItemRef<'_>,
        timeout: Duration,
    ) -> InstallerResult<PackageMetadata> {
        let url = self.config.item_url(item.id);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Upstream::GameBanana.status_error(&url, status, Some(item)));
        }

        Ok(response.json::<PackageMetadata>().await?)
    }

    /// Metadata lookup with the short inspection timeout, for checking a
    /// catalog identifier by hand.
    pub async fn inspect(&self, item_id: u64) -> InstallerResult<PackageMetadata> {
        let metadata = self
            .fetch_metadata(ItemRef::new(item_id, None), self.config.inspect_timeout())
            .await?;
        let count = metadata.files.as_ref().map_or(0, Vec::len);
        info!(
            "Item {} ({}) lists {} file(s)",
            item_id,
            metadata.name.as_deref().unwrap_or("unnamed"),
            count
        );
        Ok(metadata)
    }

    /// Resolves the entry's first listed file, downloads it and sniffs its
    /// format. HTML and unknown payloads are rejected here.
    #[instrument(skip(self, entry), fields(id = %entry.id))]
    pub async fn fetch_item(&self, entry: &CatalogEntry) -> InstallerResult<ClassifiedAsset> {
        let item_id = entry.game_banana_id.ok_or_else(|| {
            InstallerError::NotFound(format!("No download method configured for {}", entry.name))
        })?;

        let item = ItemRef::new(item_id, Some(entry.name.as_str()));
        let metadata = self
            .fetch_metadata(item, self.config.metadata_timeout())
            .await?;
        let url = metadata.first_download_url().ok_or_else(|| {
            InstallerError::NotFound(format!("No download files available for {}", entry.name))
        })?;
        info!("Download URL found: {}", url);

        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/octet-stream, application/zip, */*")
            .timeout(self.config.download_timeout());
        let asset = download_bytes(request, url, Upstream::GameBanana, Some(item)).await?;

        let kind = classify(&asset.bytes);
        match kind {
            ArchiveKind::Zip | ArchiveKind::SevenZip => {
                info!("Detected {:?} archive for {}", kind, entry.name);
                Ok(ClassifiedAsset { asset, kind })
            }
            ArchiveKind::Html => {
                warn!("{} served an HTML page instead of an archive", url);
                Err(InstallerError::HtmlPage)
            }
            ArchiveKind::Unrecognized => Err(InstallerError::UnsupportedFormat {
                content_type: asset.content_type_or_unknown(),
            }),
        }
    }
}
