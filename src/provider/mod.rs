//! Provider abstraction for grid data sources.
//!
//! The grid never fetches anything itself. A [`RecordProvider`] returns one
//! page of records together with the total count and the ids the backend can
//! sort by; a [`NameProvider`] returns the currently known dynamic column
//! names (feedback score names).

mod json;

pub use json::JsonFileProvider;

use crate::filter::Filter;
use crate::model::Record;
use crate::view::SortSpec;

/// Error types that can occur while fetching grid data.
#[derive(Debug, Clone)]
pub enum ProviderError {
    /// I/O error while reading data.
    Io(String),
    /// Error parsing fetched data.
    Parse(String),
    /// Backend refused or could not serve the request.
    Unavailable(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Io(msg) => write!(f, "I/O error: {}", msg),
            ProviderError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ProviderError::Unavailable(msg) => write!(f, "Provider unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Parameters of one page fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// 1-based page index.
    pub page: u32,
    pub size: u32,
    pub sorting: Vec<SortSpec>,
    pub search: Option<String>,
    /// All filters must match for a record to be returned.
    pub filters: Vec<Filter>,
}

/// One page of records as returned by the backend.
#[derive(Debug, Clone)]
pub struct RecordPage<R> {
    pub content: Vec<R>,
    /// Total number of matching records across all pages.
    pub total: u64,
    /// Column ids the backend can sort this dataset by.
    pub sortable_by: Vec<String>,
}

/// Source of paginated records.
pub trait RecordProvider {
    type Record: Record;

    fn fetch(&self, request: &PageRequest) -> Result<RecordPage<Self::Record>, ProviderError>;
}

/// Source of dynamic column names.
pub trait NameProvider {
    fn names(&self) -> Result<Vec<String>, ProviderError>;
}
