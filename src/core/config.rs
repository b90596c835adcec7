// ─── Installer configuration ───
// Endpoints, timeouts and game constants. Defaults match the public hosts;
// an optional JSON file can override any field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const APP_DIR_NAME: &str = "SA2ModInstaller";
const CONFIG_FILE: &str = "installer.json";
const CONFIG_ENV_VAR: &str = "SA2_INSTALLER_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub user_agent: String,
    pub release: ReleaseSourceConfig,
    pub packages: PackageSourceConfig,
    pub game: GameConfig,
    pub manager: ManagerConfig,
    pub seven_zip_path: Option<PathBuf>,
}

/// GitHub "latest release" source of the mod manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseSourceConfig {
    pub api_url: String,
    pub platform_marker: String,
    pub metadata_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

/// GameBanana per-item source of the add-on packages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSourceConfig {
    pub api_base: String,
    pub fields: String,
    pub metadata_timeout_secs: u64,
    pub inspect_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub max_redirects: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Any of these in a directory marks it as a game installation.
    pub executables: Vec<String>,
    pub fixed_paths: Vec<PathBuf>,
    pub steam_subpath: PathBuf,
    pub folder_name: String,
    /// Both must appear (case-insensitive) in an uninstall display name.
    pub name_keywords: [String; 2],
    pub steam_registry_key: String,
    pub uninstall_roots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub executable_name: String,
    pub mods_dir: String,
    pub config_file: String,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            user_agent: "SA2ModInstaller/1.0".to_string(),
            release: ReleaseSourceConfig::default(),
            packages: PackageSourceConfig::default(),
            game: GameConfig::default(),
            manager: ManagerConfig::default(),
            seven_zip_path: None,
        }
    }
}

impl Default for ReleaseSourceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com/repos/X-Hax/SA-Mod-Manager/releases/latest"
                .to_string(),
            platform_marker: "windows".to_string(),
            metadata_timeout_secs: 30,
            download_timeout_secs: 300,
        }
    }
}

impl Default for PackageSourceConfig {
    fn default() -> Self {
        Self {
            api_base: "https://gamebanana.com/apiv8".to_string(),
            fields: "_aFiles,_sName,_idRow".to_string(),
            metadata_timeout_secs: 30,
            inspect_timeout_secs: 10,
            download_timeout_secs: 120,
            max_redirects: 5,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            executables: vec!["sonic2app.exe".into(), "Sonic Adventure 2.exe".into()],
            fixed_paths: vec![
                PathBuf::from(r"C:\Program Files (x86)\Steam\steamapps\common\Sonic Adventure 2"),
                PathBuf::from(r"C:\Program Files\Steam\steamapps\common\Sonic Adventure 2"),
                PathBuf::from(r"D:\Steam\steamapps\common\Sonic Adventure 2"),
                PathBuf::from(r"D:\SteamLibrary\steamapps\common\Sonic Adventure 2"),
            ],
            steam_subpath: PathBuf::from("steamapps").join("common"),
            folder_name: "Sonic Adventure 2".to_string(),
            name_keywords: ["sonic".to_string(), "adventure".to_string()],
            steam_registry_key: r"Software\Valve\Steam".to_string(),
            uninstall_roots: vec![
                r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall".to_string(),
                r"SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall".to_string(),
            ],
        }
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            executable_name: "SA2ModManager.exe".to_string(),
            mods_dir: "mods".to_string(),
            config_file: "mods.ini".to_string(),
        }
    }
}

impl ReleaseSourceConfig {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

impl PackageSourceConfig {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn inspect_timeout(&self) -> Duration {
        Duration::from_secs(self.inspect_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn item_url(&self, item_id: u64) -> String {
        format!(
            "{}/Mod/{}?_csvProperties={}",
            self.api_base.trim_end_matches('/'),
            item_id,
            self.fields
        )
    }
}

impl InstallerConfig {
    /// Load from `$SA2_INSTALLER_CONFIG` or the per-user config directory,
    /// falling back to defaults.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .or_else(default_config_path);

        match path {
            Some(path) => Self::load_from(&path).unwrap_or_default(),
            None => Self::default(),
        }
    }

    /// `None` when the file is absent or unreadable.
    pub fn load_from(path: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(config) => {
                debug!("Loaded installer config from {:?}", path);
                Some(config)
            }
            Err(err) => {
                warn!("Ignoring unreadable config {:?}: {}", path, err);
                None
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installer.json");
        std::fs::write(
            &path,
            r#"{ "packages": { "api_base": "http://127.0.0.1:9000/" }, "user_agent": "Test/0.1" }"#,
        )
        .unwrap();

        let config = InstallerConfig::load_from(&path).unwrap();
        assert_eq!(config.user_agent, "Test/0.1");
        assert_eq!(config.packages.fields, "_aFiles,_sName,_idRow");
        assert_eq!(config.packages.max_redirects, 5);
        assert_eq!(
            config.packages.item_url(48872),
            "http://127.0.0.1:9000/Mod/48872?_csvProperties=_aFiles,_sName,_idRow"
        );
        assert_eq!(config.manager.executable_name, "SA2ModManager.exe");
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installer.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(InstallerConfig::load_from(&path).is_none());
        assert!(InstallerConfig::load_from(&dir.path().join("missing.json")).is_none());
    }

    #[test]
    fn default_timeouts_scale_with_payload() {
        let config = InstallerConfig::default();
        assert_eq!(config.release.metadata_timeout(), Duration::from_secs(30));
        assert_eq!(config.release.download_timeout(), Duration::from_secs(300));
        assert_eq!(config.packages.download_timeout(), Duration::from_secs(120));
    }
}
