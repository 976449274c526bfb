//! Cell renderers.
//!
//! A [`Renderer`] is picked once per column from its [`RenderHint`] and
//! [`SemanticType`], then applied to every cell of that column.

use serde::Serialize;

use crate::column::{RenderHint, SemanticType};
use crate::fmt::{
    MISSING, format_cost, format_ms, format_number, format_time, normalize_for_display, truncate,
};
use crate::model::CellValue;

/// Longest message preview shown in a single cell.
pub const PRETTY_MAX_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Renderer {
    Text,
    Pretty,
    Link,
    Number,
    Category,
    Status,
    Time,
    Duration,
    Cost,
    List,
    Comments,
    NumberDictionary,
    FeedbackScore,
}

impl Renderer {
    /// Picks the renderer for a column.
    pub fn resolve(hint: RenderHint, semantic_type: SemanticType) -> Self {
        match hint {
            RenderHint::Pretty => Renderer::Pretty,
            RenderHint::Link => Renderer::Link,
            RenderHint::Status => Renderer::Status,
            RenderHint::Comments => Renderer::Comments,
            RenderHint::FeedbackScore => Renderer::FeedbackScore,
            RenderHint::Auto => match semantic_type {
                SemanticType::String => Renderer::Text,
                SemanticType::Number => Renderer::Number,
                SemanticType::Category => Renderer::Category,
                SemanticType::Time => Renderer::Time,
                SemanticType::Duration => Renderer::Duration,
                SemanticType::Cost => Renderer::Cost,
                SemanticType::List => Renderer::List,
                SemanticType::NumberDictionary => Renderer::NumberDictionary,
            },
        }
    }

    /// Renders one cell as single-line text.
    pub fn render(&self, value: &CellValue) -> String {
        match (self, value) {
            (_, CellValue::Missing) => MISSING.to_string(),
            (Renderer::Pretty, CellValue::Json(v)) => {
                truncate(&normalize_for_display(&pretty_json(v)), PRETTY_MAX_CHARS)
            }
            (Renderer::Pretty, CellValue::Text(s)) => {
                truncate(&normalize_for_display(s), PRETTY_MAX_CHARS)
            }
            (Renderer::Comments, CellValue::List(items)) => match items.len() {
                1 => "1 comment".to_string(),
                n => format!("{} comments", n),
            },
            (Renderer::FeedbackScore, CellValue::Number(n)) => format!("{:.2}", n),
            (Renderer::Duration, CellValue::DurationMs(ms) | CellValue::Number(ms)) => {
                format_ms(*ms)
            }
            (Renderer::Cost, CellValue::Cost(c) | CellValue::Number(c)) => format_cost(*c),
            (_, other) => plain(other),
        }
    }
}

/// Renderer-independent text for a value.
fn plain(value: &CellValue) -> String {
    match value {
        CellValue::Missing => MISSING.to_string(),
        CellValue::Text(s) | CellValue::Status(s) => s.clone(),
        CellValue::Json(v) => v.to_string(),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Number(n) => format_number(*n),
        CellValue::Time(ts) => format_time(ts),
        CellValue::DurationMs(ms) => format_ms(*ms),
        CellValue::Cost(c) => format_cost(*c),
        CellValue::List(items) => items.join(", "),
        CellValue::Scores(scores) => scores
            .iter()
            .map(|(name, v)| format!("{}: {}", name, format_number(*v)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Unwraps the common single-field message envelopes (`{"input": ...}`).
fn pretty_json(v: &serde_json::Value) -> String {
    if let serde_json::Value::Object(map) = v
        && map.len() == 1
        && let Some(serde_json::Value::String(s)) = map.values().next()
    {
        return s.clone();
    }
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
