// ─── SA2 Mod Installer Core ───
// Backend of the setup wizard; usable without the desktop shell.
//
// Architecture:
//   core/
//     catalog/    : Add-on catalog + installation batch
//     detection/  : Game folder validation + ordered detection strategies
//     archive/    : Content sniffing + ZIP / 7z extraction
//     sources/    : GitHub release + GameBanana item fetchers
//     install/    : Orchestrator + progress events
//     manager.rs  : Mod manager placement + default mods.ini
//     mods_ini.rs : Generated mod list
//     state/      : Shared application state

pub mod archive;
pub mod catalog;
pub mod config;
pub mod detection;
pub mod error;
pub mod http;
pub mod install;
pub mod manager;
pub mod mods_ini;
pub mod sources;
pub mod state;
