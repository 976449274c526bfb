use std::collections::HashMap;

use super::{StoreError, ViewDefaults, ViewKey, ViewStateStore};
use crate::view::ViewState;

/// In-process store; state lives as long as the value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    states: HashMap<ViewKey, ViewState>,
    defaults: ViewDefaults,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self, defaults: ViewDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

impl ViewStateStore for MemoryStore {
    fn load(&self, key: &ViewKey) -> ViewState {
        self.states
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.defaults.get(key))
    }

    fn save(&mut self, key: &ViewKey, state: &ViewState) -> Result<(), StoreError> {
        self.states.insert(key.clone(), state.clone());
        Ok(())
    }

    fn reset(&mut self, key: &ViewKey) -> Result<ViewState, StoreError> {
        self.states.remove(key);
        Ok(self.defaults.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let key = ViewKey::new("threads").unwrap();
        let mut defaults = ViewDefaults::new();
        defaults.insert(key.clone(), ViewState::with_selected(["status"]));
        let mut store = MemoryStore::new().with_defaults(defaults);

        assert_eq!(store.load(&key).selected_column_ids(), ["status".to_string()]);

        let mut state = store.load(&key);
        state.set_page_index(4).unwrap();
        store.save(&key, &state).unwrap();
        assert_eq!(store.load(&key).page_index(), 4);

        let restored = store.reset(&key).unwrap();
        assert_eq!(restored.page_index(), 1);
        assert_eq!(store.load(&key), restored);
    }

    #[test]
    fn test_memory_store_last_write_wins() {
        let key = ViewKey::new("v").unwrap();
        let mut store = MemoryStore::new();
        let base = store.load(&key);

        let mut a = base.clone();
        a.set_selected_columns(vec!["a".into()]);
        let mut b = base;
        b.set_column_order(vec!["b".into()]);

        store.save(&key, &a).unwrap();
        store.save(&key, &b).unwrap();
        let loaded = store.load(&key);
        // no merge: the first writer's selection is gone
        assert!(loaded.selected_column_ids().is_empty());
        assert_eq!(loaded.column_order(), ["b".to_string()]);
    }
}
