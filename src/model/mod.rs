//! Record types consumed by the grid and the cell values they expose.

mod thread;

pub use thread::{Comment, FeedbackScore, Thread, ThreadStatus, Usage};

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

/// Value of one cell, typed by what the record knows about the field.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Missing,
    Text(String),
    /// Structured payload (message input/output).
    Json(serde_json::Value),
    Integer(i64),
    Number(f64),
    Time(DateTime<Utc>),
    /// Duration in milliseconds.
    DurationMs(f64),
    /// Estimated cost in dollars.
    Cost(f64),
    Status(String),
    List(Vec<String>),
    /// Named numeric values, e.g. all feedback scores of a row.
    Scores(Vec<(String, f64)>),
}

/// A row the grid can display.
pub trait Record {
    /// Stable row identifier.
    fn id(&self) -> &str;

    /// Value for `column_id`; unknown columns yield [`CellValue::Missing`].
    fn value(&self, column_id: &str) -> CellValue;
}

/// Sort key for local ordering of records.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Missing,
    Number(f64),
    Time(i64),
    String(String),
}

impl SortKey {
    /// Total order; missing values sort first, mismatched kinds compare by kind.
    pub fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
            (SortKey::String(a), SortKey::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Missing => 0,
            SortKey::Number(_) => 1,
            SortKey::Time(_) => 2,
            SortKey::String(_) => 3,
        }
    }
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn sort_key(&self) -> SortKey {
        match self {
            CellValue::Missing => SortKey::Missing,
            CellValue::Text(s) | CellValue::Status(s) => SortKey::String(s.clone()),
            CellValue::Json(v) => SortKey::String(v.to_string()),
            CellValue::Integer(i) => SortKey::Number(*i as f64),
            CellValue::Number(n) | CellValue::DurationMs(n) | CellValue::Cost(n) => {
                SortKey::Number(*n)
            }
            CellValue::Time(ts) => SortKey::Time(ts.timestamp_millis()),
            CellValue::List(items) => SortKey::String(items.join(",")),
            CellValue::Scores(scores) => SortKey::Number(scores.len() as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_missing_first() {
        let missing = CellValue::Missing.sort_key();
        let one = CellValue::Integer(1).sort_key();
        assert_eq!(missing.compare(&one), Ordering::Less);
        assert_eq!(one.compare(&missing), Ordering::Greater);
    }

    #[test]
    fn test_sort_key_numbers_and_text() {
        let a = CellValue::Number(1.5).sort_key();
        let b = CellValue::Cost(2.0).sort_key();
        assert_eq!(a.compare(&b), Ordering::Less);

        let x = CellValue::Text("abc".into()).sort_key();
        let y = CellValue::Text("abd".into()).sort_key();
        assert_eq!(x.compare(&y), Ordering::Less);
    }
}
