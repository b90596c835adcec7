use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{InstallerError, InstallerResult};

/// The pseudo-entry for the mod loader. It ships inside the mod manager
/// package, so the per-item loop never downloads it separately.
pub const MOD_LOADER_ID: &str = "sa2_mod_loader";

const BUILTIN_CATALOG: &str = include_str!("../../../resources/catalog.json");

/// One installable add-on as shown in the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    /// May embed HTML markup; rendered as-is by the UI.
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub game_banana_id: Option<u64>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            required: false,
            game_banana_id: None,
            download_url: None,
            preview: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_game_banana_id(mut self, id: u64) -> Self {
        self.game_banana_id = Some(id);
        self
    }

    pub fn is_mod_loader(&self) -> bool {
        self.id == MOD_LOADER_ID
    }
}

/// Read-only list of catalog entries with unique identifiers.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> InstallerResult<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(InstallerError::DuplicateCatalogId(entry.id.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn from_json(raw: &str) -> InstallerResult<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(raw)?;
        Self::new(entries)
    }

    /// The catalog bundled with the installer.
    pub fn builtin() -> InstallerResult<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// The identifiers one installation run works through: every required
    /// entry first (catalog order), then the user's picks in click order.
    /// Duplicates are dropped; unknown identifiers are kept so the
    /// orchestrator can skip them itself.
    pub fn installation_batch(&self, selected: &[String]) -> Vec<String> {
        let mut batch: Vec<String> = Vec::with_capacity(selected.len() + 2);

        let required = self
            .entries
            .iter()
            .filter(|entry| entry.required)
            .map(|entry| entry.id.as_str());

        for id in required.chain(selected.iter().map(String::as_str)) {
            if !batch.iter().any(|existing| existing == id) {
                batch.push(id.to_string());
            }
        }

        debug!("Installation batch: {:?}", batch);
        batch
    }
}
