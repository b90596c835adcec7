use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config::GameConfig;

/// One program listed under an uninstall registry root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallEntry {
    pub key_name: String,
    pub display_name: Option<String>,
    pub install_location: Option<PathBuf>,
}

impl UninstallEntry {
    /// Display name when recorded, else the registry key name.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.key_name)
    }
}

/// The platform queries detection needs. Every failure reads as "nothing
/// found" so a strategy can move on.
pub trait PlatformRegistry: Send + Sync {
    /// Root directory of the Steam client, if installed.
    fn installed_library_root(&self) -> Option<PathBuf>;

    /// Entries under `root` accepted by `predicate`, in enumeration order.
    fn search_uninstall_entries(
        &self,
        root: &str,
        predicate: &dyn Fn(&UninstallEntry) -> bool,
    ) -> Vec<UninstallEntry>;
}

/// Registry backend for the running platform.
pub fn platform_registry(config: &GameConfig) -> Arc<dyn PlatformRegistry> {
    #[cfg(windows)]
    {
        Arc::new(windows::WindowsRegistry::new(config.steam_registry_key.clone()))
    }

    #[cfg(not(windows))]
    {
        let _ = config;
        Arc::new(NoRegistry)
    }
}

/// Platforms without a system registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRegistry;

impl PlatformRegistry for NoRegistry {
    fn installed_library_root(&self) -> Option<PathBuf> {
        None
    }

    fn search_uninstall_entries(
        &self,
        _root: &str,
        _predicate: &dyn Fn(&UninstallEntry) -> bool,
    ) -> Vec<UninstallEntry> {
        Vec::new()
    }
}

#[cfg(windows)]
mod windows {
    use std::path::PathBuf;

    use tracing::debug;
    use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};
    use winreg::RegKey;

    use super::{PlatformRegistry, UninstallEntry};

    pub struct WindowsRegistry {
        steam_key: String,
    }

    impl WindowsRegistry {
        pub fn new(steam_key: String) -> Self {
            Self { steam_key }
        }
    }

    impl PlatformRegistry for WindowsRegistry {
        fn installed_library_root(&self) -> Option<PathBuf> {
            let hkcu = RegKey::predef(HKEY_CURRENT_USER);
            let key = match hkcu.open_subkey(&self.steam_key) {
                Ok(key) => key,
                Err(err) => {
                    debug!("Steam registry key unavailable: {}", err);
                    return None;
                }
            };
            let steam_path: String = key.get_value("SteamPath").ok()?;
            let steam_path = steam_path.trim();
            if steam_path.is_empty() {
                return None;
            }
            Some(PathBuf::from(steam_path.replace('/', "\\")))
        }

        fn search_uninstall_entries(
            &self,
            root: &str,
            predicate: &dyn Fn(&UninstallEntry) -> bool,
        ) -> Vec<UninstallEntry> {
            let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
            let uninstall = match hklm.open_subkey(root) {
                Ok(key) => key,
                Err(err) => {
                    debug!("Uninstall root {} unavailable: {}", root, err);
                    return Vec::new();
                }
            };

            uninstall
                .enum_keys()
                .filter_map(Result::ok)
                .filter_map(|key_name| {
                    let key = uninstall.open_subkey(&key_name).ok()?;
                    let display_name: Option<String> = key.get_value("DisplayName").ok();
                    let install_location: Option<String> =
                        key.get_value("InstallLocation").ok();
                    Some(UninstallEntry {
                        key_name,
                        display_name,
                        install_location: install_location
                            .map(|raw| raw.trim().trim_matches('"').to_string())
                            .filter(|raw| !raw.is_empty())
                            .map(PathBuf::from),
                    })
                })
                .filter(|entry| predicate(entry))
                .collect()
        }
    }
}
