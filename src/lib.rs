#[cfg(feature = "desktop")]
mod commands;
pub mod core;

use tracing_subscriber::EnvFilter;

/// Structured logging; `RUST_LOG` overrides the default filter. Safe to call
/// more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sa2_mod_installer_lib=debug")),
        )
        .try_init();
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Arc;

    use tauri::Manager;

    use crate::core::config::InstallerConfig;
    use crate::core::state::AppState;

    init_tracing();
    tracing::info!("SA2 Mod Installer {} starting...", env!("CARGO_PKG_VERSION"));

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let state = AppState::new(InstallerConfig::load())?;
            app.manage(Arc::new(state));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::detect_game,
            commands::browse_game_folder,
            commands::validate_game_path,
            commands::get_mods_list,
            commands::install_mods,
            commands::open_external,
            commands::get_version,
            commands::test_package_api,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
