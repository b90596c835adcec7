use std::path::PathBuf;
use std::sync::Arc;

use tauri::Emitter;
use tauri_plugin_dialog::DialogExt;
use tauri_plugin_opener::OpenerExt;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::core::catalog::CatalogEntry;
use crate::core::detection::InstallationTarget;
use crate::core::error::InstallerError;
use crate::core::install::{InstallOutcome, InstallRequest, ProgressEvent};
use crate::core::sources::PackageMetadata;
use crate::core::state::AppState;

const INSTALL_PROGRESS_EVENT: &str = "install-progress";

#[tauri::command]
pub async fn detect_game(
    state: tauri::State<'_, Arc<AppState>>,
) -> Result<Option<InstallationTarget>, InstallerError> {
    Ok(state.detect().await)
}

/// Opens a folder picker and validates the pick. `None` covers both a
/// cancelled dialog and a folder without the game.
#[tauri::command]
pub async fn browse_game_folder(
    app: tauri::AppHandle,
    state: tauri::State<'_, Arc<AppState>>,
) -> Result<Option<InstallationTarget>, InstallerError> {
    let (tx, rx) = oneshot::channel();
    app.dialog()
        .file()
        .set_title("Select Sonic Adventure 2 installation folder")
        .pick_folder(move |folder| {
            let _ = tx.send(folder);
        });

    let picked = rx
        .await
        .map_err(|_| InstallerError::Other("Folder dialog closed unexpectedly".into()))?;
    let Some(folder) = picked else {
        return Ok(None);
    };
    let path = folder
        .into_path()
        .map_err(|e| InstallerError::Other(format!("Unsupported folder selection: {e}")))?;

    let target = state.validate_path(path).await;
    if target.is_none() {
        warn!("Selected folder does not contain the game");
    }
    Ok(target)
}

#[tauri::command]
pub async fn validate_game_path(
    state: tauri::State<'_, Arc<AppState>>,
    path: PathBuf,
) -> Result<bool, InstallerError> {
    Ok(state.validate_path(path).await.is_some())
}

#[tauri::command]
pub async fn get_mods_list(
    state: tauri::State<'_, Arc<AppState>>,
) -> Result<Vec<CatalogEntry>, InstallerError> {
    Ok(state.catalog.entries().to_vec())
}

#[tauri::command]
pub async fn install_mods(
    app: tauri::AppHandle,
    state: tauri::State<'_, Arc<AppState>>,
    request: InstallRequest,
) -> Result<InstallOutcome, InstallerError> {
    info!(
        "Install requested for {:?} with {} selected mod(s)",
        request.game_dir,
        request.selected.len()
    );
    let emitter = app.clone();
    let sink = move |event: ProgressEvent| {
        let _ = emitter.emit(INSTALL_PROGRESS_EVENT, event);
    };
    state.install(&request, &sink).await
}

#[tauri::command]
pub async fn open_external(app: tauri::AppHandle, url: String) -> Result<(), InstallerError> {
    app.opener()
        .open_url(url.as_str(), None::<&str>)
        .map_err(|e| InstallerError::Other(format!("Failed to open {url}: {e}")))
}

#[tauri::command]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Looks up a GameBanana item, for checking catalog identifiers.
#[tauri::command]
pub async fn test_package_api(
    state: tauri::State<'_, Arc<AppState>>,
    item_id: u64,
) -> Result<PackageMetadata, InstallerError> {
    state.inspect_package(item_id).await
}
