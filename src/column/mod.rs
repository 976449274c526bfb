//! Column descriptors: static metadata describing every potential grid column.
//!
//! A [`DescriptorSet`] is built once through [`register`] and is read-only
//! afterwards. Each descriptor's [`RenderHint`] is resolved together with its
//! [`SemanticType`] into a [`Renderer`] at registration time, so rendering a
//! cell never has to look anything up by name.

pub mod catalog;
pub mod dynamic;

pub use dynamic::{DerivationCache, DynamicColumnSpec, derive};

use std::collections::HashMap;

use serde::Serialize;

use crate::render::Renderer;

/// Semantic type of the values held by a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SemanticType {
    String,
    Number,
    Category,
    Time,
    Duration,
    Cost,
    List,
    NumberDictionary,
}

impl SemanticType {
    pub fn name(&self) -> &'static str {
        match self {
            SemanticType::String => "string",
            SemanticType::Number => "number",
            SemanticType::Category => "category",
            SemanticType::Time => "time",
            SemanticType::Duration => "duration",
            SemanticType::Cost => "cost",
            SemanticType::List => "list",
            SemanticType::NumberDictionary => "numberDictionary",
        }
    }
}

/// Rendering hint attached to a descriptor.
///
/// `Auto` lets the semantic type pick the renderer; the other variants ask
/// for a specialised cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderHint {
    #[default]
    Auto,
    /// Message payloads (JSON or text) collapsed to one line.
    Pretty,
    /// Clickable identifier.
    Link,
    /// Thread status badge.
    Status,
    Comments,
    FeedbackScore,
}

/// Static metadata for one column. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    id: String,
    label: String,
    semantic_type: SemanticType,
    sortable: bool,
    render_hint: RenderHint,
    #[serde(skip_serializing_if = "Option::is_none")]
    statistic_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    explainer: Option<String>,
    /// Allowed values for category columns, used by filters.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<String>,
}

impl ColumnDescriptor {
    /// Creates a sortable descriptor with the automatic render hint.
    pub fn new(id: impl Into<String>, label: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            semantic_type,
            sortable: true,
            render_hint: RenderHint::Auto,
            statistic_key: None,
            size: None,
            explainer: None,
            options: Vec::new(),
        }
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn render(mut self, hint: RenderHint) -> Self {
        self.render_hint = hint;
        self
    }

    pub fn statistic_key(mut self, key: impl Into<String>) -> Self {
        self.statistic_key = Some(key.into());
        self
    }

    /// Default width in pixels, used when the view has no persisted width.
    pub fn size(mut self, px: u32) -> Self {
        self.size = Some(px);
        self
    }

    pub fn explainer(mut self, text: impl Into<String>) -> Self {
        self.explainer = Some(text.into());
        self
    }

    pub fn options<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.options = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn render_hint(&self) -> RenderHint {
        self.render_hint
    }

    pub fn stat_key(&self) -> Option<&str> {
        self.statistic_key.as_deref()
    }

    pub fn default_size(&self) -> Option<u32> {
        self.size
    }

    pub fn explainer_text(&self) -> Option<&str> {
        self.explainer.as_deref()
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.options
    }
}

/// Errors raised while building a descriptor set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The same column id was supplied more than once.
    DuplicateId(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicateId(id) => write!(f, "duplicate column id: {}", id),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Read-only, ordered collection of descriptors with unique ids.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    columns: Vec<ColumnDescriptor>,
    renderers: Vec<Renderer>,
    index: HashMap<String, usize>,
}

/// Builds a descriptor set, rejecting duplicate ids.
pub fn register(descriptors: Vec<ColumnDescriptor>) -> Result<DescriptorSet, RegistryError> {
    let mut index = HashMap::with_capacity(descriptors.len());
    for (i, d) in descriptors.iter().enumerate() {
        if index.insert(d.id.clone(), i).is_some() {
            return Err(RegistryError::DuplicateId(d.id.clone()));
        }
    }
    let renderers = descriptors
        .iter()
        .map(|d| Renderer::resolve(d.render_hint, d.semantic_type))
        .collect();
    Ok(DescriptorSet {
        columns: descriptors,
        renderers,
        index,
    })
}

impl DescriptorSet {
    /// Returns a new set holding these descriptors followed by `extra`.
    ///
    /// Used to append dynamically derived columns; an id already present in
    /// `self` is a [`RegistryError::DuplicateId`].
    pub fn combine(&self, extra: Vec<ColumnDescriptor>) -> Result<DescriptorSet, RegistryError> {
        let mut all = Vec::with_capacity(self.columns.len() + extra.len());
        all.extend(self.columns.iter().cloned());
        all.extend(extra);
        register(all)
    }

    pub fn get(&self, id: &str) -> Option<&ColumnDescriptor> {
        self.index.get(id).map(|&i| &self.columns[i])
    }

    pub fn renderer(&self, id: &str) -> Option<Renderer> {
        self.index.get(id).map(|&i| self.renderers[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    /// Descriptors paired with their resolved renderers, in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&ColumnDescriptor, Renderer)> {
        self.columns.iter().zip(self.renderers.iter().copied())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|d| d.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(ids: &[&str]) -> Vec<ColumnDescriptor> {
        ids.iter()
            .map(|id| ColumnDescriptor::new(*id, id.to_uppercase(), SemanticType::String))
            .collect()
    }

    #[test]
    fn test_register_unique_ids() {
        let set = register(cols(&["a", "b", "c"])).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(set.get("b").unwrap().label(), "B");
        assert!(set.get("z").is_none());
    }

    #[test]
    fn test_register_duplicate_id_fails() {
        let err = register(cols(&["a", "b", "a"])).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId("a".into()));
        assert_eq!(err.to_string(), "duplicate column id: a");
    }

    #[test]
    fn test_register_empty() {
        let set = register(Vec::new()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_combine_appends_and_rejects_collisions() {
        let base = register(cols(&["a", "b"])).unwrap();
        let combined = base.combine(cols(&["s.x", "s.y"])).unwrap();
        assert_eq!(
            combined.ids().collect::<Vec<_>>(),
            vec!["a", "b", "s.x", "s.y"]
        );
        // base is untouched
        assert_eq!(base.len(), 2);

        let err = base.combine(cols(&["b"])).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId("b".into()));
    }

    #[test]
    fn test_renderer_resolved_at_registration() {
        let set = register(vec![
            ColumnDescriptor::new("cost", "Cost", SemanticType::Cost),
            ColumnDescriptor::new("id", "ID", SemanticType::String).render(RenderHint::Link),
        ])
        .unwrap();
        assert_eq!(set.renderer("cost"), Some(Renderer::Cost));
        assert_eq!(set.renderer("id"), Some(Renderer::Link));
        assert_eq!(set.renderer("nope"), None);
    }

    #[test]
    fn test_builder_defaults() {
        let d = ColumnDescriptor::new("x", "X", SemanticType::Number);
        assert!(d.is_sortable());
        assert_eq!(d.render_hint(), RenderHint::Auto);
        assert_eq!(d.stat_key(), None);
        assert_eq!(d.default_size(), None);
        assert!(d.allowed_values().is_empty());

        let d = d.sortable(false).size(160).explainer("help").options(["x", "y"]);
        assert!(!d.is_sortable());
        assert_eq!(d.default_size(), Some(160));
        assert_eq!(d.explainer_text(), Some("help"));
        assert_eq!(d.allowed_values(), ["x".to_string(), "y".to_string()]);
    }
}
