//! View-state persistence.
//!
//! [`ViewStateStore`] is the only persisted state of the crate. Stores hold
//! one [`ViewState`] per [`ViewKey`]; writes replace the whole value
//! (last write wins) and there is no locking. Callers that need
//! read-modify-write consistency across writers synchronize externally.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::HashMap;

use crate::view::ViewState;

/// Identifier of a persisted view. Also used as a file name by [`FileStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewKey(String);

impl ViewKey {
    pub fn new(key: impl Into<String>) -> Result<Self, StoreError> {
        let key = key.into();
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if valid {
            Ok(Self(key))
        } else {
            Err(StoreError::InvalidKey(key))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ViewKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
pub enum StoreError {
    InvalidKey(String),
    Io(std::io::Error),
    Encode(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::InvalidKey(key) => write!(f, "invalid view key '{}'", key),
            StoreError::Io(e) => write!(f, "I/O error: {}", e),
            StoreError::Encode(e) => write!(f, "encode error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::InvalidKey(_) => None,
            StoreError::Io(e) => Some(e),
            StoreError::Encode(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Encode(err)
    }
}

/// Durable per-view state.
pub trait ViewStateStore {
    /// Returns the stored state, or the view's default when nothing usable is
    /// stored. Never fails.
    fn load(&self, key: &ViewKey) -> ViewState;

    /// Replaces the stored state for `key`.
    fn save(&mut self, key: &ViewKey, state: &ViewState) -> Result<(), StoreError>;

    /// Discards the stored state and returns the default now in effect.
    fn reset(&mut self, key: &ViewKey) -> Result<ViewState, StoreError>;
}

/// Per-view defaults returned for keys with no stored state.
#[derive(Debug, Clone, Default)]
pub struct ViewDefaults {
    defaults: HashMap<ViewKey, ViewState>,
}

impl ViewDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ViewKey, state: ViewState) {
        self.defaults.insert(key, state);
    }

    /// Registered default for `key`, else [`ViewState::default`].
    pub fn get(&self, key: &ViewKey) -> ViewState {
        self.defaults.get(key).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_key_validation() {
        assert!(ViewKey::new("threads").is_ok());
        assert!(ViewKey::new("project-1.threads_v2").is_ok());
        assert!(ViewKey::new("").is_err());
        assert!(ViewKey::new(".hidden").is_err());
        assert!(ViewKey::new("../etc/passwd").is_err());
        assert!(ViewKey::new("a/b").is_err());
    }

    #[test]
    fn test_view_defaults() {
        let key = ViewKey::new("threads").unwrap();
        let mut defaults = ViewDefaults::new();
        assert_eq!(defaults.get(&key), ViewState::default());

        defaults.insert(key.clone(), ViewState::with_selected(["a"]));
        assert_eq!(defaults.get(&key).selected_column_ids(), ["a".to_string()]);
    }
}
