//! Column catalog for the threads grid.
//!
//! Three descriptor lists are kept, mirroring how the grid uses them:
//! - [`thread_columns`]: user-togglable columns shown in the grid,
//! - [`thread_filter_columns`]: columns offered by the filter builder,
//! - [`thread_id_column`]: the pinned identifier column.

use super::{ColumnDescriptor, DynamicColumnSpec, RenderHint, SemanticType};

pub const COLUMN_ID_ID: &str = "id";
pub const COLUMN_SELECT_ID: &str = "select";
pub const COLUMN_USAGE_ID: &str = "usage";
pub const COLUMN_STATUS_ID: &str = "status";
pub const COLUMN_COMMENTS_ID: &str = "comments";
pub const COLUMN_FEEDBACK_SCORES_ID: &str = "feedback_scores";

/// View key under which the threads grid persists its state.
pub const THREADS_VIEW_KEY: &str = "threads";

pub const THREAD_COST_EXPLAINER: &str = "The thread cost is the sum of the estimated costs of all \
     LLM spans in the thread's traces, based on token usage and model pricing.";

/// Columns shown by default when the view has no persisted selection.
pub const DEFAULT_SELECTED_COLUMNS: &[&str] = &[
    "first_message",
    "last_message",
    "number_of_messages",
    "created_at",
    "last_updated_at",
    "duration",
    "status",
];

/// Values a thread status filter accepts.
pub const THREAD_STATUS_OPTIONS: &[&str] = &["inactive", "active"];

/// Columns pinned to the left edge; always shown, never togglable.
pub const PINNED_COLUMNS: &[&str] = &[COLUMN_SELECT_ID, COLUMN_ID_ID];

fn shared_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("first_message", "First message", SemanticType::String)
            .size(400)
            .render(RenderHint::Pretty),
        ColumnDescriptor::new("last_message", "Last message", SemanticType::String)
            .size(400)
            .render(RenderHint::Pretty),
        ColumnDescriptor::new("number_of_messages", "No. of messages", SemanticType::Number),
        ColumnDescriptor::new(COLUMN_STATUS_ID, "Status", SemanticType::Category)
            .render(RenderHint::Status),
        ColumnDescriptor::new(
            format!("{}.total_tokens", COLUMN_USAGE_ID),
            "Total tokens",
            SemanticType::Number,
        ),
        ColumnDescriptor::new("total_estimated_cost", "Estimated cost", SemanticType::Cost)
            .explainer(THREAD_COST_EXPLAINER)
            .size(160),
        ColumnDescriptor::new("created_at", "Created at", SemanticType::Time),
        ColumnDescriptor::new("last_updated_at", "Last updated", SemanticType::Time),
        ColumnDescriptor::new("duration", "Duration", SemanticType::Duration),
    ]
}

/// The pinned identifier column.
pub fn thread_id_column() -> ColumnDescriptor {
    ColumnDescriptor::new(COLUMN_ID_ID, "ID", SemanticType::String).render(RenderHint::Link)
}

/// Togglable grid columns, in their default order.
///
/// The identifier column is included first so the combined set can resolve
/// it; it is pinned rather than selected.
pub fn thread_columns() -> Vec<ColumnDescriptor> {
    let mut columns = vec![thread_id_column()];
    columns.extend(shared_columns());
    columns.extend([
        ColumnDescriptor::new("start_time", "Start time", SemanticType::Time),
        ColumnDescriptor::new("end_time", "End time", SemanticType::Time),
        ColumnDescriptor::new("created_by", "Created by", SemanticType::String),
        ColumnDescriptor::new(COLUMN_COMMENTS_ID, "Comments", SemanticType::String)
            .render(RenderHint::Comments),
        ColumnDescriptor::new("tags", "Tags", SemanticType::List),
    ]);
    columns
}

/// Columns offered by the filter builder.
///
/// `status` is restricted to the thread status values; `feedback_scores`
/// filters need a score name as key.
pub fn thread_filter_columns() -> Vec<ColumnDescriptor> {
    let mut columns = vec![ColumnDescriptor::new(COLUMN_ID_ID, "ID", SemanticType::String)];
    columns.extend(shared_columns().into_iter().map(|c| {
        if c.id() == COLUMN_STATUS_ID {
            c.options(THREAD_STATUS_OPTIONS.iter().copied())
        } else {
            c
        }
    }));
    columns.push(ColumnDescriptor::new(
        COLUMN_FEEDBACK_SCORES_ID,
        "Feedback scores",
        SemanticType::NumberDictionary,
    ));
    columns
}

/// One numeric column per discovered feedback score name.
pub fn feedback_scores_spec() -> DynamicColumnSpec {
    DynamicColumnSpec::new(COLUMN_FEEDBACK_SCORES_ID, COLUMN_FEEDBACK_SCORES_ID)
        .with_type(SemanticType::Number)
        .with_hint(RenderHint::FeedbackScore)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::register;

    #[test]
    fn test_catalogs_register() {
        let grid = register(thread_columns()).unwrap();
        assert_eq!(grid.ids().next(), Some(COLUMN_ID_ID));
        assert!(grid.contains("usage.total_tokens"));
        assert!(grid.contains("tags"));
        for id in DEFAULT_SELECTED_COLUMNS {
            assert!(grid.contains(id), "missing default column {}", id);
        }

        let filters = register(thread_filter_columns()).unwrap();
        assert_eq!(
            filters.get(COLUMN_FEEDBACK_SCORES_ID).unwrap().semantic_type(),
            SemanticType::NumberDictionary
        );
        assert!(!filters.contains("tags"));
        assert_eq!(
            filters.get(COLUMN_STATUS_ID).unwrap().allowed_values(),
            ["inactive".to_string(), "active".to_string()]
        );
        // the grid's status column carries no filter options
        assert!(grid.get(COLUMN_STATUS_ID).unwrap().allowed_values().is_empty());
    }

    #[test]
    fn test_cost_column_metadata() {
        let grid = register(thread_columns()).unwrap();
        let cost = grid.get("total_estimated_cost").unwrap();
        assert_eq!(cost.default_size(), Some(160));
        assert!(cost.explainer_text().is_some());
    }

    #[test]
    fn test_feedback_scores_spec_does_not_collide() {
        let grid = register(thread_columns()).unwrap();
        let dynamic = crate::column::derive(&feedback_scores_spec(), &["accuracy"]);
        assert!(grid.combine(dynamic).is_ok());
    }
}
