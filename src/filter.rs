//! Row filters.
//!
//! A [`Filter`] names a column of the filter catalog, an operator and a
//! value. Dictionary columns (feedback scores) also need a key selecting one
//! entry. Filters are checked against the catalog with [`Filter::validate`]
//! before a fetch and evaluated per record by [`Filter::matches`].
//!
//! Text form used by the CLI: `FIELD OP [VALUE]`, where `FIELD` is a column id
//! or `id[key]`, e.g. `status = active`, `feedback_scores[accuracy] >= 0.5`,
//! `tags is_empty`.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::column::{DescriptorSet, SemanticType};
use crate::model::{CellValue, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "not_contains")]
    NotContains,
    #[serde(rename = "starts_with")]
    StartsWith,
    #[serde(rename = "ends_with")]
    EndsWith,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "is_empty")]
    IsEmpty,
    #[serde(rename = "is_not_empty")]
    IsNotEmpty,
}

const OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::NotEquals,
    FilterOperator::Contains,
    FilterOperator::NotContains,
    FilterOperator::StartsWith,
    FilterOperator::EndsWith,
    FilterOperator::GreaterThan,
    FilterOperator::GreaterThanOrEqual,
    FilterOperator::LessThan,
    FilterOperator::LessThanOrEqual,
    FilterOperator::IsEmpty,
    FilterOperator::IsNotEmpty,
];

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "=",
            FilterOperator::NotEquals => "!=",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "not_contains",
            FilterOperator::StartsWith => "starts_with",
            FilterOperator::EndsWith => "ends_with",
            FilterOperator::GreaterThan => ">",
            FilterOperator::GreaterThanOrEqual => ">=",
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanOrEqual => "<=",
            FilterOperator::IsEmpty => "is_empty",
            FilterOperator::IsNotEmpty => "is_not_empty",
        }
    }

    pub fn takes_value(&self) -> bool {
        !matches!(self, FilterOperator::IsEmpty | FilterOperator::IsNotEmpty)
    }

    /// Whether the operator applies to columns of `semantic_type`.
    pub fn supports(&self, semantic_type: SemanticType) -> bool {
        match self {
            FilterOperator::Equals
            | FilterOperator::NotEquals
            | FilterOperator::IsEmpty
            | FilterOperator::IsNotEmpty => true,
            FilterOperator::Contains | FilterOperator::NotContains => {
                matches!(semantic_type, SemanticType::String | SemanticType::List)
            }
            FilterOperator::StartsWith | FilterOperator::EndsWith => {
                semantic_type == SemanticType::String
            }
            FilterOperator::GreaterThan
            | FilterOperator::GreaterThanOrEqual
            | FilterOperator::LessThan
            | FilterOperator::LessThanOrEqual => matches!(
                semantic_type,
                SemanticType::Number
                    | SemanticType::Time
                    | SemanticType::Duration
                    | SemanticType::Cost
                    | SemanticType::NumberDictionary
            ),
        }
    }
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FilterOperator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        OPERATORS
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| FilterError::Parse(format!("unknown filter operator '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Text form could not be parsed.
    Parse(String),
    /// Column is not offered by the filter catalog.
    UnknownColumn(String),
    /// Dictionary column filtered without a key.
    MissingKey(String),
    /// Key given for a column that is not a dictionary.
    UnexpectedKey(String),
    UnsupportedOperator {
        column: String,
        operator: FilterOperator,
    },
    MissingValue(String),
    InvalidValue {
        column: String,
        value: String,
        expected: String,
    },
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterError::Parse(msg) => write!(f, "{}", msg),
            FilterError::UnknownColumn(c) => write!(f, "column '{}' cannot be filtered", c),
            FilterError::MissingKey(c) => write!(f, "filter on '{}' needs a key, e.g. {}[name]", c, c),
            FilterError::UnexpectedKey(c) => write!(f, "column '{}' does not take a key", c),
            FilterError::UnsupportedOperator { column, operator } => {
                write!(f, "operator '{}' does not apply to column '{}'", operator, column)
            }
            FilterError::MissingValue(c) => write!(f, "filter on '{}' needs a value", c),
            FilterError::InvalidValue {
                column,
                value,
                expected,
            } => write!(
                f,
                "invalid value '{}' for column '{}': expected {}",
                value, column, expected
            ),
        }
    }
}

impl std::error::Error for FilterError {}

/// One filter criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column_id: String,
    /// Entry of a dictionary column, e.g. a feedback score name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
}

impl Filter {
    pub fn new(column_id: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            key: None,
            operator,
            value: value.into(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Record column the filter reads: `column_id`, or `column_id.key`.
    pub fn target(&self) -> String {
        match &self.key {
            Some(key) => format!("{}.{}", self.column_id, key),
            None => self.column_id.clone(),
        }
    }

    /// Checks the filter against the columns that may be filtered on.
    pub fn validate(&self, columns: &DescriptorSet) -> Result<(), FilterError> {
        let column = &self.column_id;
        let descriptor = columns
            .get(column)
            .ok_or_else(|| FilterError::UnknownColumn(column.clone()))?;
        let semantic_type = descriptor.semantic_type();

        let keyed = semantic_type == SemanticType::NumberDictionary;
        match self.key.as_deref().map(str::trim) {
            None | Some("") if keyed => return Err(FilterError::MissingKey(column.clone())),
            Some(_) if !keyed => return Err(FilterError::UnexpectedKey(column.clone())),
            _ => {}
        }

        if !self.operator.supports(semantic_type) {
            return Err(FilterError::UnsupportedOperator {
                column: column.clone(),
                operator: self.operator,
            });
        }
        if !self.operator.takes_value() {
            return Ok(());
        }

        let value = self.value.trim();
        if value.is_empty() {
            return Err(FilterError::MissingValue(column.clone()));
        }
        let invalid = |expected: String| FilterError::InvalidValue {
            column: column.clone(),
            value: value.to_string(),
            expected,
        };
        match semantic_type {
            SemanticType::Number
            | SemanticType::Duration
            | SemanticType::Cost
            | SemanticType::NumberDictionary => {
                if value.parse::<f64>().is_err() {
                    return Err(invalid("a number".into()));
                }
            }
            SemanticType::Time => {
                if parse_time(value).is_none() {
                    return Err(invalid("an RFC 3339 timestamp".into()));
                }
            }
            _ => {
                let options = descriptor.allowed_values();
                if !options.is_empty()
                    && matches!(
                        self.operator,
                        FilterOperator::Equals | FilterOperator::NotEquals
                    )
                    && !options.iter().any(|o| o.eq_ignore_ascii_case(value))
                {
                    return Err(invalid(format!("one of {}", options.join(", "))));
                }
            }
        }
        Ok(())
    }

    /// Evaluates the filter on one record. Missing values only match
    /// `is_empty`.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        let cell = record.value(&self.target());
        match self.operator {
            FilterOperator::IsEmpty => is_empty(&cell),
            FilterOperator::IsNotEmpty => !is_empty(&cell),
            op => compare(op, &cell, self.value.trim()),
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.column_id)?;
        if let Some(key) = &self.key {
            write!(f, "[{}]", key)?;
        }
        write!(f, " {}", self.operator)?;
        if self.operator.takes_value() {
            write!(f, " {}", self.value)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let field_end = match s.find('[') {
            Some(open) if !s[..open].contains(char::is_whitespace) => s[open..]
                .find(']')
                .map(|close| open + close + 1)
                .ok_or_else(|| FilterError::Parse(format!("unclosed '[' in filter '{}'", s)))?,
            _ => s.find(char::is_whitespace).unwrap_or(s.len()),
        };
        let (field, rest) = s.split_at(field_end);
        let rest = rest.trim_start();
        let (op, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        if op.is_empty() {
            return Err(FilterError::Parse(format!(
                "expected 'FIELD OP [VALUE]', got '{}'",
                s
            )));
        }
        let operator: FilterOperator = op.parse()?;

        let (column_id, key) = match field.strip_suffix(']').and_then(|f| f.split_once('[')) {
            Some((column, key)) => (column, Some(key.trim().to_string())),
            None => (field, None),
        };
        if column_id.is_empty() {
            return Err(FilterError::Parse(format!("missing column in filter '{}'", s)));
        }
        let value = value.trim();
        if operator.takes_value() && value.is_empty() {
            return Err(FilterError::MissingValue(column_id.to_string()));
        }

        Ok(Filter {
            column_id: column_id.to_string(),
            key,
            operator,
            value: value.to_string(),
        })
    }
}

/// Checks every filter, stopping at the first invalid one.
pub fn validate_all(filters: &[Filter], columns: &DescriptorSet) -> Result<(), FilterError> {
    filters.iter().try_for_each(|f| f.validate(columns))
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn is_empty(cell: &CellValue) -> bool {
    match cell {
        CellValue::Missing => true,
        CellValue::Text(s) | CellValue::Status(s) => s.is_empty(),
        CellValue::Json(v) => v.is_null(),
        CellValue::List(items) => items.is_empty(),
        CellValue::Scores(scores) => scores.is_empty(),
        _ => false,
    }
}

fn compare(op: FilterOperator, cell: &CellValue, value: &str) -> bool {
    match cell {
        CellValue::Missing | CellValue::Scores(_) => false,
        CellValue::Integer(i) => compare_number(op, *i as f64, value),
        CellValue::Number(n) | CellValue::DurationMs(n) | CellValue::Cost(n) => {
            compare_number(op, *n, value)
        }
        CellValue::Time(ts) => parse_time(value).is_some_and(|v| ordered(op, ts.cmp(&v))),
        CellValue::Text(s) | CellValue::Status(s) => compare_text(op, s, value),
        CellValue::Json(v) => compare_text(op, &v.to_string(), value),
        CellValue::List(items) => match op {
            FilterOperator::NotEquals => !items
                .iter()
                .any(|i| compare_text(FilterOperator::Equals, i, value)),
            FilterOperator::NotContains => !items
                .iter()
                .any(|i| compare_text(FilterOperator::Contains, i, value)),
            _ => items.iter().any(|i| compare_text(op, i, value)),
        },
    }
}

fn compare_number(op: FilterOperator, n: f64, value: &str) -> bool {
    value
        .parse::<f64>()
        .is_ok_and(|v| n.partial_cmp(&v).is_some_and(|ord| ordered(op, ord)))
}

fn ordered(op: FilterOperator, ord: Ordering) -> bool {
    match op {
        FilterOperator::Equals => ord == Ordering::Equal,
        FilterOperator::NotEquals => ord != Ordering::Equal,
        FilterOperator::GreaterThan => ord == Ordering::Greater,
        FilterOperator::GreaterThanOrEqual => ord != Ordering::Less,
        FilterOperator::LessThan => ord == Ordering::Less,
        FilterOperator::LessThanOrEqual => ord != Ordering::Greater,
        _ => false,
    }
}

/// Case-insensitive text comparison.
fn compare_text(op: FilterOperator, text: &str, value: &str) -> bool {
    let text = text.to_lowercase();
    let value = value.to_lowercase();
    match op {
        FilterOperator::Contains => text.contains(&value),
        FilterOperator::NotContains => !text.contains(&value),
        FilterOperator::StartsWith => text.starts_with(&value),
        FilterOperator::EndsWith => text.ends_with(&value),
        _ => ordered(op, text.cmp(&value)),
    }
}
