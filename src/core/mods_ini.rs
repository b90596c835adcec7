use std::fmt::Write as _;
use std::path::Path;

use tracing::info;

use crate::core::catalog::Catalog;
use crate::core::error::{InstallerError, InstallerResult};

const MANAGER_SECTION: &str = "ModManager";
const ENABLED_KEY: &str = "EnabledMods";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledMod {
    pub id: String,
    pub name: String,
}

/// The mod list handed to the manager: one `[ModManager]` section with the
/// enabled identifiers, then one section per mod.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModsIni {
    pub enabled: Vec<EnabledMod>,
}

impl ModsIni {
    /// Keeps batch order; identifiers missing from the catalog are left out.
    pub fn from_batch(catalog: &Catalog, batch: &[String]) -> Self {
        let enabled = batch
            .iter()
            .filter_map(|id| catalog.get(id))
            .map(|entry| EnabledMod {
                id: entry.id.clone(),
                name: entry.name.clone(),
            })
            .collect();
        Self { enabled }
    }

    pub fn enabled_ids(&self) -> Vec<&str> {
        self.enabled.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[{MANAGER_SECTION}]");
        let _ = writeln!(out, "{ENABLED_KEY}={}", self.enabled_ids().join(","));
        out.push('\n');

        for m in &self.enabled {
            let _ = writeln!(out, "[{}]", m.id);
            let _ = writeln!(out, "Name={}", m.name);
            out.push_str("Enabled=1\n\n");
        }
        out
    }

    /// Reads back a rendered file. Sections not listed in `EnabledMods`, or
    /// not marked `Enabled=1`, are ignored.
    pub fn parse(raw: &str) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut sections: Vec<(String, Option<String>, bool)> = Vec::new();
        let mut current: Option<String> = None;

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current = Some(name.to_string());
                if name != MANAGER_SECTION {
                    sections.push((name.to_string(), None, false));
                }
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());

            match current.as_deref() {
                Some(MANAGER_SECTION) => {
                    if key == ENABLED_KEY {
                        order = value
                            .split(',')
                            .map(str::trim)
                            .filter(|id| !id.is_empty())
                            .map(str::to_string)
                            .collect();
                    }
                }
                Some(_) => {
                    if let Some(section) = sections.last_mut() {
                        match key {
                            "Name" => section.1 = Some(value.to_string()),
                            "Enabled" => section.2 = value == "1",
                            _ => {}
                        }
                    }
                }
                None => {}
            }
        }

        let enabled = order
            .into_iter()
            .filter_map(|id| {
                let (_, name, on) = sections.iter().find(|(s, _, _)| *s == id)?;
                on.then(|| EnabledMod {
                    name: name.clone().unwrap_or_else(|| id.clone()),
                    id,
                })
            })
            .collect();
        Self { enabled }
    }

    /// Replaces the file at `path`.
    pub async fn write(&self, path: &Path) -> InstallerResult<()> {
        tokio::fs::write(path, self.render())
            .await
            .map_err(|source| InstallerError::io(path, source))?;
        info!("Wrote {} enabled mod(s) to {:?}", self.enabled.len(), path);
        Ok(())
    }
}
