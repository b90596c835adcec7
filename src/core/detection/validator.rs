use std::path::Path;

use tracing::debug;

/// Decides whether a directory holds the game by looking for one of its
/// executables among the directory's immediate entries.
#[derive(Debug, Clone)]
pub struct PathValidator {
    executables: Vec<String>,
}

impl PathValidator {
    pub fn new(executables: Vec<String>) -> Self {
        Self { executables }
    }

    /// Fails closed: a missing or unreadable directory is simply invalid.
    pub fn is_valid_installation(&self, dir: &Path) -> bool {
        if dir.as_os_str().is_empty() {
            return false;
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("Cannot list {:?}: {}", dir, err);
                return false;
            }
        };

        entries.filter_map(Result::ok).any(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            self.executables.iter().any(|exe| *exe == name)
        })
    }
}
