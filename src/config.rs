//! Runtime configuration.

use std::path::PathBuf;

use crate::view::{DEFAULT_PAGE_SIZE, RowHeight};

/// Settings shared by the CLI and embedding hosts.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Directory holding persisted view states. Default: `./.tracegrid`.
    pub state_dir: PathBuf,
    /// Page size for views with no stored state. Default: 100.
    pub default_page_size: u32,
    /// Row height for views with no stored state.
    pub default_row_height: RowHeight,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".tracegrid"),
            default_page_size: DEFAULT_PAGE_SIZE,
            default_row_height: RowHeight::Small,
        }
    }
}

impl GridConfig {
    /// Creates a GridConfig with a custom state directory and default values.
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            ..Self::default()
        }
    }
}
