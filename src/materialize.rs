//! Column materialization: descriptors + view state -> columns to render.

use std::collections::HashSet;

use serde::Serialize;
use tracing::trace;

use crate::column::{DescriptorSet, SemanticType};
use crate::render::Renderer;
use crate::view::ViewState;

/// A column ready for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterializedColumn {
    pub id: String,
    pub label: String,
    pub semantic_type: SemanticType,
    /// Declared sortable by the descriptor and allowed by the data source.
    pub sortable: bool,
    pub pinned: bool,
    pub renderer: Renderer,
    /// Persisted width, else the descriptor's default size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistic_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explainer: Option<String>,
}

/// Builds the ordered list of columns to render.
///
/// 1. Ids from `state.column_order` come first (ids with no descriptor are
///    skipped); descriptor ids missing from it follow in descriptor order.
/// 2. Only selected or pinned ids are kept.
/// 3. A column is sortable when its descriptor says so and its id is in
///    `sortable_ids`.
///
/// The result keeps the order of step 1. With nothing selected only pinned
/// columns are returned.
pub fn materialize<S: AsRef<str>, P: AsRef<str>>(
    all: &DescriptorSet,
    state: &ViewState,
    sortable_ids: &[S],
    pinned_ids: &[P],
) -> Vec<MaterializedColumn> {
    let sortable: HashSet<&str> = sortable_ids.iter().map(|s| s.as_ref()).collect();
    let pinned: HashSet<&str> = pinned_ids.iter().map(|s| s.as_ref()).collect();
    let selected: HashSet<&str> = state
        .selected_column_ids()
        .iter()
        .map(|s| s.as_str())
        .collect();

    let mut seen: HashSet<&str> = HashSet::with_capacity(all.len());
    let mut order: Vec<&str> = Vec::with_capacity(all.len());
    for id in state.column_order() {
        if all.contains(id) && seen.insert(id.as_str()) {
            order.push(id.as_str());
        }
    }
    for id in all.ids() {
        if seen.insert(id) {
            order.push(id);
        }
    }

    let columns: Vec<MaterializedColumn> = order
        .into_iter()
        .filter(|id| selected.contains(id) || pinned.contains(id))
        .filter_map(|id| {
            let descriptor = all.get(id)?;
            let renderer = all.renderer(id)?;
            Some(MaterializedColumn {
                id: id.to_string(),
                label: descriptor.label().to_string(),
                semantic_type: descriptor.semantic_type(),
                sortable: descriptor.is_sortable() && sortable.contains(id),
                pinned: pinned.contains(id),
                renderer,
                width: state.column_width(id).or(descriptor.default_size()),
                statistic_key: descriptor.stat_key().map(str::to_string),
                explainer: descriptor.explainer_text().map(str::to_string),
            })
        })
        .collect();

    trace!(
        descriptors = all.len(),
        materialized = columns.len(),
        "materialized columns"
    );
    columns
}
