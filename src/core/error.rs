use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the installer backend.
/// Every module returns `Result<T, InstallerError>`.
#[derive(Debug, Error)]
pub enum InstallerError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status} for {url}")]
    Upstream {
        service: &'static str,
        url: String,
        status: u16,
    },

    #[error("{service} rate limit exceeded. Please try again later.")]
    RateLimited { service: &'static str },

    #[error("{0}")]
    UpstreamNotFound(String),

    #[error("Invalid GameBanana ID {0}. Please check the catalog entry.")]
    InvalidItemId(u64),

    // ── Lookup ──────────────────────────────────────────
    #[error("{0}")]
    NotFound(String),

    // ── Archive ─────────────────────────────────────────
    #[error("Downloaded file is not a supported archive format (ZIP/7z). Content-Type: {content_type}")]
    UnsupportedFormat { content_type: String },

    #[error("Download appears to be HTML page instead of archive file. The mod may require manual download.")]
    HtmlPage,

    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to extract 7z archive: {0}")]
    Extraction(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Catalog ─────────────────────────────────────────
    #[error("Duplicate catalog identifier: {0}")]
    DuplicateCatalogId(String),

    // ── Orchestration ───────────────────────────────────
    #[error("An installation is already running")]
    InstallInProgress,

    #[error("Failed to download SA2 Mod Manager: {source}")]
    ManagerDownload { source: Box<InstallerError> },

    #[error("Failed to download {name}: {source}")]
    PackageDownload {
        name: String,
        source: Box<InstallerError>,
    },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type InstallerResult<T> = Result<T, InstallerError>;

/// Stable classification of an [`InstallerError`], handed to the UI next to
/// the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    UnsupportedFormat,
    Upstream,
    Io,
    Busy,
    Other,
}

impl InstallerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallerError::Io {
            path: path.into(),
            source,
        }
    }

    /// Classifies the error, looking through the download context wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InstallerError::NotFound(_) | InstallerError::UpstreamNotFound(_) => {
                ErrorKind::NotFound
            }
            InstallerError::UnsupportedFormat { .. }
            | InstallerError::HtmlPage
            | InstallerError::Zip(_)
            | InstallerError::Extraction(_) => ErrorKind::UnsupportedFormat,
            InstallerError::Http(_)
            | InstallerError::Upstream { .. }
            | InstallerError::RateLimited { .. }
            | InstallerError::InvalidItemId(_)
            | InstallerError::Json(_) => ErrorKind::Upstream,
            InstallerError::Io { .. } => ErrorKind::Io,
            InstallerError::InstallInProgress => ErrorKind::Busy,
            InstallerError::ManagerDownload { source }
            | InstallerError::PackageDownload { source, .. } => source.kind(),
            InstallerError::DuplicateCatalogId(_) | InstallerError::Other(_) => ErrorKind::Other,
        }
    }
}

// ── Serialization for Tauri IPC ─────────────────────────
// Tauri commands require the error type to implement `Serialize`.
impl serde::Serialize for InstallerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
