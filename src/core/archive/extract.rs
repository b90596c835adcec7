use std::io::Cursor;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::sniff::ArchiveKind;
use crate::core::config::InstallerConfig;
use crate::core::error::{InstallerError, InstallerResult};

/// 7-Zip prints this on a clean run, even when it also wrote warnings.
const SEVEN_ZIP_SUCCESS: &str = "Everything is Ok";

#[cfg(windows)]
const BUNDLED_SEVEN_ZIP: &str = "7za.exe";
#[cfg(not(windows))]
const BUNDLED_SEVEN_ZIP: &str = "7za";

/// Unpacks classified buffers. ZIP is read in memory; 7z goes through the
/// external 7-Zip helper and a staging file.
#[derive(Debug, Clone)]
pub struct Extractor {
    seven_zip: PathBuf,
}

impl Extractor {
    pub fn new(seven_zip: PathBuf) -> Self {
        Self { seven_zip }
    }

    pub fn from_config(config: &InstallerConfig) -> Self {
        Self::new(locate_seven_zip(config.seven_zip_path.as_deref()))
    }

    pub fn seven_zip(&self) -> &Path {
        &self.seven_zip
    }

    /// Extracts `bytes` into `dest`, creating it if needed and overwriting
    /// existing files.
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn extract(
        &self,
        bytes: Vec<u8>,
        kind: ArchiveKind,
        dest: &Path,
    ) -> InstallerResult<()> {
        match kind {
            ArchiveKind::Zip => {
                let dest = dest.to_path_buf();
                let written =
                    tokio::task::spawn_blocking(move || extract_zip(&bytes, &dest))
                        .await
                        .map_err(|e| InstallerError::Other(format!("Task join error: {e}")))??;
                debug!("Extracted {} zip entries", written);
                Ok(())
            }
            ArchiveKind::SevenZip => self.extract_seven_zip(&bytes, dest).await,
            ArchiveKind::Html => Err(InstallerError::HtmlPage),
            ArchiveKind::Unrecognized => Err(InstallerError::UnsupportedFormat {
                content_type: "unknown".into(),
            }),
        }
    }

    async fn extract_seven_zip(&self, bytes: &[u8], dest: &Path) -> InstallerResult<()> {
        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|source| InstallerError::io(dest, source))?;

        // Dropped, and so deleted, on every return path below.
        let staging_dir = dest.parent().unwrap_or(dest);
        let staging = StagingFile::write(staging_dir, "7z", bytes).await?;

        info!("Running {:?} on {:?}", self.seven_zip, staging.path());
        let output = Command::new(&self.seven_zip)
            .arg("x")
            .arg(staging.path())
            .arg(format!("-o{}", dest.display()))
            .arg("-y")
            .output()
            .await
            .map_err(|source| InstallerError::io(&self.seven_zip, source))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reported_ok = stdout.contains(SEVEN_ZIP_SUCCESS) || stderr.contains(SEVEN_ZIP_SUCCESS);

        if !output.status.success() && !reported_ok {
            let detail = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(InstallerError::Extraction(format!(
                "7z exited with {}: {}",
                output.status, detail
            )));
        }

        if !stderr.trim().is_empty() && !stderr.contains(SEVEN_ZIP_SUCCESS) {
            warn!("7z stderr: {}", stderr.trim());
        }
        debug!("7z stdout: {}", stdout.trim());
        Ok(())
    }
}

/// Extracts every entry of an in-memory ZIP below `dest`, keeping the
/// archive's folder structure. Returns the number of files written.
pub fn extract_zip(bytes: &[u8], dest: &Path) -> InstallerResult<usize> {
    std::fs::create_dir_all(dest).map_err(|source| InstallerError::io(dest, source))?;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut written = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe zip entry {:?}", entry.name());
            continue;
        };

        let out_path = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .map_err(|source| InstallerError::io(&out_path, source))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| InstallerError::io(parent, source))?;
        }

        let mut out = std::fs::File::create(&out_path)
            .map_err(|source| InstallerError::io(&out_path, source))?;
        std::io::copy(&mut entry, &mut out).map_err(|source| InstallerError::io(&out_path, source))?;
        written += 1;
    }

    Ok(written)
}

/// Unpacks the mod manager archive flat into `dest`: the first `.exe` entry
/// becomes `canonical_exe`, every other file lands in `dest` under its base
/// name. Further executables are dropped when a main one was found.
pub fn extract_manager_zip(
    bytes: &[u8],
    dest: &Path,
    canonical_exe: &str,
) -> InstallerResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dest).map_err(|source| InstallerError::io(dest, source))?;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut main_exe = None;
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if !entry.is_dir() && is_executable_name(entry.name()) {
            main_exe = Some(index);
            break;
        }
    }

    let mut written = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let out_path = if Some(index) == main_exe {
            dest.join(canonical_exe)
        } else if main_exe.is_some() && is_executable_name(entry.name()) {
            debug!("Skipping extra executable {}", entry.name());
            continue;
        } else {
            let Some(base) = entry
                .enclosed_name()
                .and_then(|path| path.file_name().map(|name| name.to_owned()))
            else {
                warn!("Skipping unsafe zip entry {:?}", entry.name());
                continue;
            };
            dest.join(base)
        };

        let mut out = std::fs::File::create(&out_path)
            .map_err(|source| InstallerError::io(&out_path, source))?;
        std::io::copy(&mut entry, &mut out).map_err(|source| InstallerError::io(&out_path, source))?;
        debug!("Extracted {} -> {:?}", entry.name(), out_path);
        written.push(out_path);
    }

    Ok(written)
}

fn is_executable_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".exe")
}

/// Explicit path, then a copy shipped next to the installer, then the usual
/// 7-Zip install folders, then whatever `7z` resolves to on `PATH`.
pub fn locate_seven_zip(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(dir.join(BUNDLED_SEVEN_ZIP));
    }
    if cfg!(windows) {
        candidates.push(PathBuf::from(r"C:\Program Files\7-Zip\7z.exe"));
        candidates.push(PathBuf::from(r"C:\Program Files (x86)\7-Zip\7z.exe"));
    }

    candidates
        .into_iter()
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from("7z"))
}

/// A downloaded buffer persisted for a tool that needs a file path.
/// Removed when dropped.
struct StagingFile {
    path: PathBuf,
}

impl StagingFile {
    async fn write(dir: &Path, extension: &str, bytes: &[u8]) -> InstallerResult<Self> {
        let path = dir.join(format!(".staging-{}.{}", Uuid::new_v4(), extension));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| InstallerError::io(&path, source))?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if let Err(source) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove staging file {:?}: {}", self.path, source);
        }
    }
}
