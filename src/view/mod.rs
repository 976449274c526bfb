//! Persisted per-view table state.
//!
//! [`ViewState`] holds everything the user can configure on a grid: which
//! columns are shown, their order and widths, sorting, pagination and row
//! height. Every setter replaces its field wholesale; there is no partial
//! merging.

mod navigation;

pub use navigation::{PageWindow, RowCursor};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn is_desc(&self) -> bool {
        matches!(self, SortDirection::Desc)
    }
}

impl std::str::FromStr for SortDirection {
    type Err = ViewStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(ViewStateError::InvalidValue(format!(
                "unknown sort direction '{}'",
                other
            ))),
        }
    }
}

/// One sort criterion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub column_id: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column_id: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_id: column_id.into(),
            direction,
        }
    }
}

impl std::str::FromStr for SortSpec {
    type Err = ViewStateError;

    /// Parses `ID`, `ID:asc` or `ID:desc`. A suffix after the last `:` that is
    /// not a direction stays part of the id (score names may contain `:`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((id, dir)) = s.rsplit_once(':')
            && let Ok(direction) = dir.parse::<SortDirection>()
        {
            if id.is_empty() {
                return Err(ViewStateError::InvalidValue(format!(
                    "missing column id in sort '{}'",
                    s
                )));
            }
            return Ok(SortSpec::new(id, direction));
        }
        if s.is_empty() {
            return Err(ViewStateError::InvalidValue("empty sort column".into()));
        }
        Ok(SortSpec::new(s, SortDirection::Asc))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowHeight {
    #[default]
    Small,
    Medium,
    Large,
}

impl std::str::FromStr for RowHeight {
    type Err = ViewStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "small" => Ok(RowHeight::Small),
            "medium" => Ok(RowHeight::Medium),
            "large" => Ok(RowHeight::Large),
            other => Err(ViewStateError::InvalidValue(format!(
                "unknown row height '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStateError {
    /// Page index must be at least 1.
    InvalidPageIndex(u32),
    /// Page size must be positive.
    InvalidPageSize(u32),
    InvalidValue(String),
}

impl std::fmt::Display for ViewStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewStateError::InvalidPageIndex(p) => write!(f, "invalid page index {} (must be >= 1)", p),
            ViewStateError::InvalidPageSize(s) => write!(f, "invalid page size {} (must be > 0)", s),
            ViewStateError::InvalidValue(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ViewStateError {}

/// User-configurable state of one grid view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    selected_column_ids: Vec<String>,
    column_order: Vec<String>,
    column_widths: BTreeMap<String, u32>,
    sort: Vec<SortSpec>,
    page_index: u32,
    page_size: u32,
    row_height: RowHeight,
}

impl Default for ViewState {
    /// Nothing selected, natural column order, no widths or sorting,
    /// first page of [`DEFAULT_PAGE_SIZE`] rows, small rows.
    fn default() -> Self {
        Self {
            selected_column_ids: Vec::new(),
            column_order: Vec::new(),
            column_widths: BTreeMap::new(),
            sort: Vec::new(),
            page_index: 1,
            page_size: DEFAULT_PAGE_SIZE,
            row_height: RowHeight::Small,
        }
    }
}

/// Removes repeated ids, keeping the first occurrence.
fn dedup_ordered(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Removes repeated sort columns, keeping the first criterion for each.
fn dedup_sort(sort: Vec<SortSpec>) -> Vec<SortSpec> {
    let mut seen = std::collections::HashSet::with_capacity(sort.len());
    sort.into_iter()
        .filter(|s| seen.insert(s.column_id.clone()))
        .collect()
}

impl ViewState {
    /// Default state with an initial column selection.
    pub fn with_selected<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        let mut state = Self::default();
        state.set_selected_columns(ids.into_iter().map(Into::into).collect());
        state
    }

    pub fn selected_column_ids(&self) -> &[String] {
        &self.selected_column_ids
    }

    pub fn column_order(&self) -> &[String] {
        &self.column_order
    }

    pub fn column_widths(&self) -> &BTreeMap<String, u32> {
        &self.column_widths
    }

    pub fn column_width(&self, id: &str) -> Option<u32> {
        self.column_widths.get(id).copied()
    }

    pub fn sort(&self) -> &[SortSpec] {
        &self.sort
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn row_height(&self) -> RowHeight {
        self.row_height
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_column_ids.iter().any(|s| s == id)
    }

    /// Replaces the selection. Repeated ids are kept once.
    pub fn set_selected_columns(&mut self, ids: Vec<String>) {
        self.selected_column_ids = dedup_ordered(ids);
    }

    /// Replaces the column order. Repeated ids are kept once.
    pub fn set_column_order(&mut self, ids: Vec<String>) {
        self.column_order = dedup_ordered(ids);
    }

    pub fn set_column_widths(&mut self, widths: BTreeMap<String, u32>) {
        self.column_widths = widths;
    }

    /// Replaces the sort criteria. A column listed twice keeps its first
    /// direction.
    pub fn set_sort(&mut self, sort: Vec<SortSpec>) {
        self.sort = dedup_sort(sort);
    }

    pub fn set_page_index(&mut self, page_index: u32) -> Result<(), ViewStateError> {
        if page_index == 0 {
            return Err(ViewStateError::InvalidPageIndex(page_index));
        }
        self.page_index = page_index;
        Ok(())
    }

    pub fn set_page_size(&mut self, page_size: u32) -> Result<(), ViewStateError> {
        if page_size == 0 {
            return Err(ViewStateError::InvalidPageSize(page_size));
        }
        self.page_size = page_size;
        Ok(())
    }

    pub fn set_row_height(&mut self, row_height: RowHeight) {
        self.row_height = row_height;
    }

    /// Repairs values that a hand-edited or older state file may carry.
    pub(crate) fn sanitize(mut self) -> Self {
        if self.page_index == 0 {
            self.page_index = 1;
        }
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        self.selected_column_ids = dedup_ordered(self.selected_column_ids);
        self.column_order = dedup_ordered(self.column_order);
        self.sort = dedup_sort(self.sort);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_view_state() {
        let s = ViewState::default();
        assert!(s.selected_column_ids().is_empty());
        assert!(s.column_order().is_empty());
        assert!(s.sort().is_empty());
        assert_eq!(s.page_index(), 1);
        assert_eq!(s.page_size(), 100);
        assert_eq!(s.row_height(), RowHeight::Small);
    }

    #[test]
    fn test_setters_replace_whole_field() {
        let mut s = ViewState::with_selected(["a", "b"]);
        s.set_selected_columns(vec!["c".into()]);
        assert_eq!(s.selected_column_ids(), ["c".to_string()]);

        let mut widths = BTreeMap::new();
        widths.insert("a".to_string(), 100);
        s.set_column_widths(widths);
        let mut widths = BTreeMap::new();
        widths.insert("b".to_string(), 50);
        s.set_column_widths(widths);
        assert_eq!(s.column_width("a"), None);
        assert_eq!(s.column_width("b"), Some(50));
    }

    #[test]
    fn test_ordered_sets_dedup() {
        let mut s = ViewState::default();
        s.set_column_order(vec!["b".into(), "a".into(), "b".into()]);
        assert_eq!(s.column_order(), ["b".to_string(), "a".to_string()]);

        s.set_sort(vec![
            SortSpec::new("x", SortDirection::Desc),
            SortSpec::new("x", SortDirection::Asc),
        ]);
        assert_eq!(s.sort(), [SortSpec::new("x", SortDirection::Desc)]);
    }

    #[test]
    fn test_invalid_pagination_rejected() {
        let mut s = ViewState::default();
        assert_eq!(s.set_page_index(0), Err(ViewStateError::InvalidPageIndex(0)));
        assert_eq!(s.set_page_size(0), Err(ViewStateError::InvalidPageSize(0)));
        assert_eq!(s.page_index(), 1);
        assert_eq!(s.page_size(), 100);

        s.set_page_index(3).unwrap();
        s.set_page_size(25).unwrap();
        assert_eq!((s.page_index(), s.page_size()), (3, 25));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: ViewState = serde_json::from_str(r#"{"page_size": 0, "row_height": "large"}"#).unwrap();
        let s = s.sanitize();
        assert_eq!(s.page_size(), 100);
        assert_eq!(s.page_index(), 1);
        assert_eq!(s.row_height(), RowHeight::Large);

        // hand-edited file repeating a sort column: first criterion wins
        let s: ViewState = serde_json::from_str(
            r#"{"sort": [{"column_id": "id", "direction": "desc"},
                         {"column_id": "id", "direction": "asc"},
                         {"column_id": "status", "direction": "asc"}]}"#,
        )
        .unwrap();
        let s = s.sanitize();
        assert_eq!(
            s.sort(),
            [
                SortSpec::new("id", SortDirection::Desc),
                SortSpec::new("status", SortDirection::Asc),
            ]
        );
    }

    #[test]
    fn test_parse_sort_spec() {
        assert_eq!(
            "last_updated_at:desc".parse::<SortSpec>().unwrap(),
            SortSpec::new("last_updated_at", SortDirection::Desc)
        );
        assert_eq!(
            "id".parse::<SortSpec>().unwrap(),
            SortSpec::new("id", SortDirection::Asc)
        );
        // a ':' inside a score name is part of the id
        assert_eq!(
            "feedback_scores.a:b".parse::<SortSpec>().unwrap(),
            SortSpec::new("feedback_scores.a:b", SortDirection::Asc)
        );
        assert_eq!(
            "feedback_scores.a:b:DESC".parse::<SortSpec>().unwrap(),
            SortSpec::new("feedback_scores.a:b", SortDirection::Desc)
        );
        assert!(":desc".parse::<SortSpec>().is_err());
        assert!("".parse::<SortSpec>().is_err());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert_eq!("medium".parse::<RowHeight>().unwrap(), RowHeight::Medium);
        assert!("huge".parse::<RowHeight>().is_err());
    }
}
