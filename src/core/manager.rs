use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::archive::extract_manager_zip;
use crate::core::config::ManagerConfig;
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::sources::FetchedAsset;

/// Written once, only when the game folder has no mods config yet.
pub const DEFAULT_MODS_INI: &str = "; SA2 Mods Configuration\n\
[Main]\n\
EnabledMods=\n\
UpdateCheck=1\n\
\n\
[ModManager]\n\
Theme=Dark\n";

/// Installs a downloaded manager release into the game folder. A bare
/// executable is written under the canonical name; a ZIP is unpacked flat
/// next to it.
pub async fn install_manager(
    asset: FetchedAsset,
    game_dir: &Path,
    config: &ManagerConfig,
) -> InstallerResult<PathBuf> {
    let name = asset
        .name
        .clone()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let exe_path = game_dir.join(&config.executable_name);

    if name.ends_with(".exe") {
        tokio::fs::write(&exe_path, &asset.bytes)
            .await
            .map_err(|source| InstallerError::io(&exe_path, source))?;
        info!("SA2 Mod Manager executable installed at {:?}", exe_path);
    } else if name.ends_with(".zip") {
        info!("Extracting SA2 Mod Manager from ZIP...");
        let dest = game_dir.to_path_buf();
        let canonical = config.executable_name.clone();
        let written = tokio::task::spawn_blocking(move || {
            extract_manager_zip(&asset.bytes, &dest, &canonical)
        })
        .await
        .map_err(|e| InstallerError::Other(format!("Task join error: {e}")))??;
        debug!("Manager archive wrote {} file(s)", written.len());
    } else {
        return Err(InstallerError::Other(
            "Unsupported mod manager file format".to_string(),
        ));
    }

    ensure_default_config(&game_dir.join(&config.config_file)).await?;
    Ok(exe_path)
}

/// Creates `path` with [`DEFAULT_MODS_INI`] unless it already exists.
/// Returns whether a file was written.
pub async fn ensure_default_config(path: &Path) -> InstallerResult<bool> {
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await;

    let mut file = match file {
        Ok(file) => file,
        Err(source) if source.kind() == IoErrorKind::AlreadyExists => {
            debug!("Keeping existing {:?}", path);
            return Ok(false);
        }
        Err(source) => return Err(InstallerError::io(path, source)),
    };

    file.write_all(DEFAULT_MODS_INI.as_bytes())
        .await
        .map_err(|source| InstallerError::io(path, source))?;
    file.flush()
        .await
        .map_err(|source| InstallerError::io(path, source))?;
    Ok(true)
}

/// Starts the installed manager without waiting for it.
pub fn launch_manager(exe_path: &Path) -> InstallerResult<()> {
    if !exe_path.is_file() {
        return Err(InstallerError::NotFound(format!(
            "Mod manager not found at {}",
            exe_path.display()
        )));
    }

    #[cfg(target_os = "windows")]
    let mut command = {
        let mut cmd = Command::new(exe_path);
        if let Some(dir) = exe_path.parent() {
            cmd.current_dir(dir);
        }
        cmd
    };

    #[cfg(target_os = "macos")]
    let mut command = {
        let mut cmd = Command::new("open");
        cmd.arg(exe_path);
        cmd
    };

    #[cfg(all(unix, not(target_os = "macos")))]
    let mut command = {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(exe_path);
        cmd
    };

    command
        .spawn()
        .map_err(|source| InstallerError::io(exe_path, source))?;
    info!("Opened SA2 Mod Manager");
    Ok(())
}
