use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{StoreError, ViewDefaults, ViewKey, ViewStateStore};
use crate::view::ViewState;

/// Store keeping one JSON document per view key (`<key>.json`) in a directory.
///
/// Writes go to a `.tmp` file that is renamed over the target, so a reader
/// sees either the previous or the new state, never a partial one.
pub struct FileStore {
    base_path: PathBuf,
    defaults: ViewDefaults,
}

impl FileStore {
    /// Opens (creating if needed) the state directory.
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        // Cleanup leftovers of interrupted writes
        if let Ok(entries) = fs::read_dir(&base_path) {
            for entry in entries.flatten() {
                if entry.path().extension().is_some_and(|ext| ext == "tmp") {
                    let _ = fs::remove_file(entry.path());
                }
            }
        }

        Ok(Self {
            base_path,
            defaults: ViewDefaults::new(),
        })
    }

    pub fn with_defaults(mut self, defaults: ViewDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &ViewKey) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

impl ViewStateStore for FileStore {
    fn load(&self, key: &ViewKey) -> ViewState {
        let path = self.path_for(key);
        let data = match fs::read(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(view = %key, "no stored view state, using default");
                return self.defaults.get(key);
            }
            Err(e) => {
                warn!("Failed to read view state {}: {}", path.display(), e);
                return self.defaults.get(key);
            }
        };

        match serde_json::from_slice::<ViewState>(&data) {
            Ok(state) => {
                debug!(view = %key, "loaded view state");
                state.sanitize()
            }
            Err(e) => {
                warn!(
                    "Corrupt view state {} ({}), using default",
                    path.display(),
                    e
                );
                self.defaults.get(key)
            }
        }
    }

    fn save(&mut self, key: &ViewKey, state: &ViewState) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let raw = serde_json::to_vec_pretty(state)?;

        let tmp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&raw)?;
        file.sync_all()?;
        drop(file);

        // Atomic rename
        fs::rename(&tmp_path, &path)?;
        debug!(view = %key, bytes = raw.len(), "saved view state");
        Ok(())
    }

    fn reset(&mut self, key: &ViewKey) -> Result<ViewState, StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => debug!(view = %key, "view state reset"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(self.defaults.get(key))
    }
}
