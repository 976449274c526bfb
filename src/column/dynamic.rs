//! Runtime-derived columns (one column per discovered name, e.g. per feedback score).

use serde::Serialize;
use tracing::debug;
use xxhash_rust::xxh3::Xxh3;

use super::{ColumnDescriptor, RenderHint, SemanticType};

/// Template for columns whose existence depends on runtime-discovered names.
///
/// Each name produces a descriptor with id `"{base_id}.{name}"`, label `name`
/// and statistic key `"{suffix_key}.{name}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DynamicColumnSpec {
    pub base_id: String,
    pub suffix_key: String,
    pub semantic_type: SemanticType,
    pub render_hint: RenderHint,
}

impl DynamicColumnSpec {
    pub fn new(base_id: impl Into<String>, suffix_key: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            suffix_key: suffix_key.into(),
            semantic_type: SemanticType::Number,
            render_hint: RenderHint::Auto,
        }
    }

    pub fn with_type(mut self, semantic_type: SemanticType) -> Self {
        self.semantic_type = semantic_type;
        self
    }

    pub fn with_hint(mut self, hint: RenderHint) -> Self {
        self.render_hint = hint;
        self
    }

    /// Column id produced for `name`.
    pub fn column_id(&self, name: &str) -> String {
        format!("{}.{}", self.base_id, name)
    }

    /// Returns the name part of `column_id` if it belongs to this spec.
    pub fn name_of<'a>(&self, column_id: &'a str) -> Option<&'a str> {
        column_id
            .strip_prefix(self.base_id.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
    }
}

/// Expands `spec` into one descriptor per distinct name.
///
/// Output is ordered by name in ascending code-point order whatever the input
/// order, so the column order stays stable when names are added.
pub fn derive<S: AsRef<str>>(spec: &DynamicColumnSpec, names: &[S]) -> Vec<ColumnDescriptor> {
    let mut sorted: Vec<&str> = names.iter().map(|n| n.as_ref()).collect();
    sorted.sort_unstable();
    sorted.dedup();

    sorted
        .into_iter()
        .map(|name| {
            ColumnDescriptor::new(spec.column_id(name), name, spec.semantic_type)
                .render(spec.render_hint)
                .statistic_key(format!("{}.{}", spec.suffix_key, name))
        })
        .collect()
}

/// Memoizes the most recent derivation.
///
/// Name lists are refreshed periodically; an unchanged list (in any order)
/// hits the cache and returns the previously derived descriptors.
#[derive(Debug, Default)]
pub struct DerivationCache {
    key: Option<u64>,
    columns: Vec<ColumnDescriptor>,
}

impl DerivationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn derive<S: AsRef<str>>(
        &mut self,
        spec: &DynamicColumnSpec,
        names: &[S],
    ) -> &[ColumnDescriptor] {
        let key = cache_key(spec, names);
        if self.key == Some(key) {
            debug!(base_id = %spec.base_id, "dynamic columns unchanged");
        } else {
            self.columns = derive(spec, names);
            self.key = Some(key);
            debug!(
                base_id = %spec.base_id,
                count = self.columns.len(),
                "derived dynamic columns"
            );
        }
        &self.columns
    }

    pub fn clear(&mut self) {
        self.key = None;
        self.columns.clear();
    }
}

fn cache_key<S: AsRef<str>>(spec: &DynamicColumnSpec, names: &[S]) -> u64 {
    let mut sorted: Vec<&str> = names.iter().map(|n| n.as_ref()).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut hasher = Xxh3::new();
    hasher.update(spec.base_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(spec.suffix_key.as_bytes());
    hasher.update(&[0]);
    hasher.update(spec.semantic_type.name().as_bytes());
    hasher.update(&[spec.render_hint as u8]);
    for name in sorted {
        hasher.update(&[0]);
        hasher.update(name.as_bytes());
    }
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> DynamicColumnSpec {
        DynamicColumnSpec::new("feedback_scores", "feedback_scores")
            .with_hint(RenderHint::FeedbackScore)
    }

    #[test]
    fn test_derive_sorts_names() {
        let cols = derive(&spec(), &["relevance", "Accuracy", "hallucination"]);
        let ids: Vec<_> = cols.iter().map(|c| c.id()).collect();
        // code-point order: uppercase before lowercase
        assert_eq!(
            ids,
            vec![
                "feedback_scores.Accuracy",
                "feedback_scores.hallucination",
                "feedback_scores.relevance",
            ]
        );
        assert_eq!(cols[0].label(), "Accuracy");
        assert_eq!(cols[0].stat_key(), Some("feedback_scores.Accuracy"));
        assert_eq!(cols[0].semantic_type(), SemanticType::Number);
        assert_eq!(cols[0].render_hint(), RenderHint::FeedbackScore);
    }

    #[test]
    fn test_derive_order_independent() {
        assert_eq!(derive(&spec(), &["b", "a"]), derive(&spec(), &["a", "b"]));
    }

    #[test]
    fn test_derive_empty() {
        let names: [&str; 0] = [];
        assert!(derive(&spec(), &names).is_empty());
    }

    #[test]
    fn test_derive_collapses_duplicates() {
        let cols = derive(&spec(), &["a", "b", "a"]);
        assert_eq!(cols.len(), 2);
    }

    #[test]
    fn test_derive_is_byte_identical() {
        let a = serde_json::to_vec(&derive(&spec(), &["x", "y"])).unwrap();
        let b = serde_json::to_vec(&derive(&spec(), &["y", "x"])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_name_of() {
        let s = spec();
        assert_eq!(s.name_of("feedback_scores.accuracy"), Some("accuracy"));
        assert_eq!(s.name_of("feedback_scores"), None);
        assert_eq!(s.name_of("usage.total_tokens"), None);
    }

    #[test]
    fn test_cache_reuses_unchanged_names() {
        let mut cache = DerivationCache::new();
        let first = cache.derive(&spec(), &["b", "a"]).to_vec();
        let key = cache.key;
        let second = cache.derive(&spec(), &["a", "b"]).to_vec();
        assert_eq!(first, second);
        assert_eq!(cache.key, key);

        let third = cache.derive(&spec(), &["a", "b", "c"]).to_vec();
        assert_eq!(third.len(), 3);
        assert_ne!(cache.key, key);
    }
}
