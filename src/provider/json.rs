//! Provider backed by a JSON dump of the threads endpoint.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use super::{NameProvider, PageRequest, ProviderError, RecordPage, RecordProvider};
use crate::model::{Record, Thread};

/// Accepted file shapes: a full page response or a bare array of threads.
#[derive(Deserialize)]
#[serde(untagged)]
enum Dump {
    Page {
        content: Vec<Thread>,
        #[serde(default)]
        sortable_by: Vec<String>,
    },
    List(Vec<Thread>),
}

/// Serves search, filters, sorting and paging locally over threads loaded from a file.
///
/// Useful offline and in tests: it behaves like the remote endpoint, including
/// ignoring sort criteria on columns outside `sortable_by`.
#[derive(Debug, Clone, Default)]
pub struct JsonFileProvider {
    threads: Vec<Thread>,
    sortable_by: Vec<String>,
}

impl JsonFileProvider {
    pub fn new(threads: Vec<Thread>, sortable_by: Vec<String>) -> Self {
        Self {
            threads,
            sortable_by,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| ProviderError::Io(format!("{}: {}", path.display(), e)))?;
        let provider = Self::from_slice(&data)?;
        info!(
            "Loaded {} threads from {}",
            provider.threads.len(),
            path.display()
        );
        Ok(provider)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, ProviderError> {
        let dump: Dump =
            serde_json::from_slice(data).map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(match dump {
            Dump::Page {
                content,
                sortable_by,
            } => Self::new(content, sortable_by),
            Dump::List(content) => Self::new(content, Vec::new()),
        })
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

impl RecordProvider for JsonFileProvider {
    type Record = Thread;

    fn fetch(&self, request: &PageRequest) -> Result<RecordPage<Thread>, ProviderError> {
        if request.page == 0 || request.size == 0 {
            return Err(ProviderError::Unavailable(format!(
                "invalid page request: page={}, size={}",
                request.page, request.size
            )));
        }

        let needle = request
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let mut matched: Vec<&Thread> = self
            .threads
            .iter()
            .filter(|t| {
                needle
                    .as_ref()
                    .is_none_or(|n| t.id.to_lowercase().contains(n.as_str()))
            })
            .filter(|t| request.filters.iter().all(|f| f.matches(*t)))
            .collect();

        let sorting: Vec<_> = request
            .sorting
            .iter()
            .filter(|s| self.sortable_by.contains(&s.column_id))
            .collect();
        if sorting.len() < request.sorting.len() {
            debug!(
                requested = request.sorting.len(),
                applied = sorting.len(),
                "ignoring sort criteria on unsortable columns"
            );
        }
        if !sorting.is_empty() {
            matched.sort_by(|a, b| {
                for spec in &sorting {
                    let ord = a
                        .value(&spec.column_id)
                        .sort_key()
                        .compare(&b.value(&spec.column_id).sort_key());
                    let ord = if spec.direction.is_desc() {
                        ord.reverse()
                    } else {
                        ord
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let total = matched.len() as u64;
        let offset = (request.page as usize - 1).saturating_mul(request.size as usize);
        let content = matched
            .into_iter()
            .skip(offset)
            .take(request.size as usize)
            .cloned()
            .collect();

        Ok(RecordPage {
            content,
            total,
            sortable_by: self.sortable_by.clone(),
        })
    }
}

impl NameProvider for JsonFileProvider {
    fn names(&self) -> Result<Vec<String>, ProviderError> {
        let names: BTreeSet<&str> = self
            .threads
            .iter()
            .flat_map(|t| t.feedback_scores.iter().map(|f| f.name.as_str()))
            .collect();
        Ok(names.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, FilterOperator};
    use crate::view::{SortDirection, SortSpec};

    const DUMP: &str = r#"{
        "content": [
            {"id": "t-3", "number_of_messages": 1, "last_updated_at": "2025-01-03T00:00:00Z",
             "feedback_scores": [{"name": "relevance", "value": 0.1}]},
            {"id": "t-1", "number_of_messages": 5, "last_updated_at": "2025-01-01T00:00:00Z",
             "feedback_scores": [{"name": "accuracy", "value": 0.9}]},
            {"id": "x-2", "number_of_messages": 3, "last_updated_at": "2025-01-02T00:00:00Z"}
        ],
        "sortable_by": ["id", "last_updated_at"]
    }"#;

    fn provider() -> JsonFileProvider {
        JsonFileProvider::from_slice(DUMP.as_bytes()).unwrap()
    }

    fn request(page: u32, size: u32) -> PageRequest {
        PageRequest {
            page,
            size,
            sorting: Vec::new(),
            search: None,
            filters: Vec::new(),
        }
    }

    fn ids(page: &RecordPage<Thread>) -> Vec<&str> {
        page.content.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_fetch_pages() {
        let p = provider();
        let page = p.fetch(&request(1, 2)).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(ids(&page), vec!["t-3", "t-1"]);
        assert_eq!(page.sortable_by, vec!["id", "last_updated_at"]);

        let page = p.fetch(&request(2, 2)).unwrap();
        assert_eq!(ids(&page), vec!["x-2"]);

        let page = p.fetch(&request(5, 2)).unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_fetch_sorts_only_allowed_columns() {
        let p = provider();
        let mut req = request(1, 10);
        req.sorting = vec![SortSpec::new("last_updated_at", SortDirection::Desc)];
        assert_eq!(ids(&p.fetch(&req).unwrap()), vec!["t-3", "x-2", "t-1"]);

        req.sorting = vec![SortSpec::new("number_of_messages", SortDirection::Asc)];
        // not in sortable_by: file order kept
        assert_eq!(ids(&p.fetch(&req).unwrap()), vec!["t-3", "t-1", "x-2"]);
    }

    #[test]
    fn test_fetch_search_by_id() {
        let p = provider();
        let mut req = request(1, 10);
        req.search = Some("T-".into());
        let page = p.fetch(&req).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(ids(&page), vec!["t-3", "t-1"]);
    }

    #[test]
    fn test_fetch_applies_filters() {
        let p = provider();
        let mut req = request(1, 10);
        req.filters = vec![Filter::new(
            "number_of_messages",
            FilterOperator::GreaterThanOrEqual,
            "3",
        )];
        let page = p.fetch(&req).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(ids(&page), vec!["t-1", "x-2"]);

        // filters combine with search and with each other
        req.search = Some("t-".into());
        req.filters.push(
            Filter::new("feedback_scores", FilterOperator::GreaterThan, "0.5").with_key("accuracy"),
        );
        assert_eq!(ids(&p.fetch(&req).unwrap()), vec!["t-1"]);
    }

    #[test]
    fn test_fetch_rejects_zero_page() {
        assert!(provider().fetch(&request(0, 10)).is_err());
    }

    #[test]
    fn test_names_are_distinct_and_sorted() {
        assert_eq!(provider().names().unwrap(), vec!["accuracy", "relevance"]);
    }

    #[test]
    fn test_bare_array_dump() {
        let p = JsonFileProvider::from_slice(br#"[{"id": "a"}]"#).unwrap();
        assert_eq!(p.len(), 1);
        assert!(p.fetch(&request(1, 1)).unwrap().sortable_by.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let err = JsonFileProvider::from_slice(b"nope").unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }
}
