use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, StatusCode};
use tracing::debug;

use crate::core::error::{InstallerError, InstallerResult};

/// Cap on the up-front allocation taken from a server-declared length.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// A downloaded body kept in memory, plus what the server claimed about it.
/// The declared values are hints only.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub bytes: Vec<u8>,
    pub url: String,
    pub name: Option<String>,
    pub declared_size: Option<u64>,
    pub content_type: Option<String>,
}

impl FetchedAsset {
    pub fn content_type_or_unknown(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// The catalog item a request was made for, used in error messages.
#[derive(Debug, Clone, Copy)]
pub struct ItemRef<'a> {
    pub id: u64,
    pub name: Option<&'a str>,
}

impl<'a> ItemRef<'a> {
    pub fn new(id: u64, name: Option<&'a str>) -> Self {
        Self { id, name }
    }
}

/// The two content hosts; each maps HTTP failures to its own messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    GitHub,
    GameBanana,
}

impl Upstream {
    pub fn service_name(self) -> &'static str {
        match self {
            Upstream::GitHub => "GitHub API",
            Upstream::GameBanana => "GameBanana",
        }
    }

    pub fn status_error(self, url: &str, status: StatusCode, item: Option<ItemRef<'_>>) -> InstallerError {
        match (self, status.as_u16(), item) {
            (Upstream::GitHub, 403 | 429, _) | (Upstream::GameBanana, 429, _) => {
                InstallerError::RateLimited {
                    service: self.service_name(),
                }
            }
            (Upstream::GitHub, 404, _) => InstallerError::UpstreamNotFound(
                "SA Mod Manager repository not found. Please check the repository URL.".into(),
            ),
            (Upstream::GameBanana, 400, Some(item)) => InstallerError::InvalidItemId(item.id),
            (Upstream::GameBanana, 404, Some(ItemRef { id, name })) => {
                InstallerError::UpstreamNotFound(match name {
                    Some(name) => format!("Mod {name} (ID: {id}) not found on GameBanana."),
                    None => format!("ID {id} not found on GameBanana."),
                })
            }
            _ => InstallerError::Upstream {
                service: self.service_name(),
                url: url.to_string(),
                status: status.as_u16(),
            },
        }
    }
}

/// Sends `request` and reads the whole body, logging progress in 10% steps
/// when the server declares a length.
pub async fn download_bytes(
    request: RequestBuilder,
    url: &str,
    upstream: Upstream,
    item: Option<ItemRef<'_>>,
) -> InstallerResult<FetchedAsset> {
    debug!("GET {}", url);
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(upstream.status_error(url, status, item));
    }

    let declared_size = response.content_length();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let final_url = response.url().to_string();

    let capacity = declared_size.unwrap_or(0).min(MAX_PREALLOC) as usize;
    let mut bytes = Vec::with_capacity(capacity);
    let mut last_step = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        bytes.extend_from_slice(&chunk);

        if let Some(total) = declared_size.filter(|total| *total > 0) {
            let step = (bytes.len() as u64 * 10 / total).min(10);
            if step > last_step {
                last_step = step;
                debug!("Download progress for {}: {}%", url, step * 10);
            }
        }
    }

    debug!(
        "Downloaded {} bytes from {} (Content-Type: {})",
        bytes.len(),
        final_url,
        content_type.as_deref().unwrap_or("unknown")
    );

    Ok(FetchedAsset {
        bytes,
        url: final_url,
        name: None,
        declared_size,
        content_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_per_host() {
        let url = "https://example.invalid";
        assert!(matches!(
            Upstream::GitHub.status_error(url, StatusCode::FORBIDDEN, None),
            InstallerError::RateLimited { service: "GitHub API" }
        ));
        assert!(matches!(
            Upstream::GameBanana.status_error(url, StatusCode::FORBIDDEN, Some(ItemRef::new(1, None))),
            InstallerError::Upstream { status: 403, .. }
        ));
        assert!(matches!(
            Upstream::GameBanana.status_error(url, StatusCode::TOO_MANY_REQUESTS, Some(ItemRef::new(1, None))),
            InstallerError::RateLimited { service: "GameBanana" }
        ));
        assert!(matches!(
            Upstream::GameBanana.status_error(url, StatusCode::BAD_REQUEST, Some(ItemRef::new(77, None))),
            InstallerError::InvalidItemId(77)
        ));
        let not_found = Upstream::GameBanana.status_error(url, StatusCode::NOT_FOUND, Some(ItemRef::new(5, None)));
        assert_eq!(not_found.to_string(), "ID 5 not found on GameBanana.");
        let named = Upstream::GameBanana.status_error(
            url,
            StatusCode::NOT_FOUND,
            Some(ItemRef::new(452445, Some("Render Fix"))),
        );
        assert_eq!(named.to_string(), "Mod Render Fix (ID: 452445) not found on GameBanana.");
    }
}
