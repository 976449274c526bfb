use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CellValue, Record};
use crate::column::catalog::{COLUMN_FEEDBACK_SCORES_ID, COLUMN_USAGE_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    #[default]
    Active,
    Inactive,
}

impl ThreadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ThreadStatus::Active => "Active",
            ThreadStatus::Inactive => "Inactive",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackScore {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// A conversation thread: a group of traces sharing a thread id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub first_message: Option<serde_json::Value>,
    #[serde(default)]
    pub last_message: Option<serde_json::Value>,
    #[serde(default)]
    pub number_of_messages: Option<u64>,
    #[serde(default)]
    pub status: ThreadStatus,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub total_estimated_cost: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Milliseconds.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub feedback_scores: Vec<FeedbackScore>,
}

impl Thread {
    pub fn feedback_score(&self, name: &str) -> Option<&FeedbackScore> {
        self.feedback_scores.iter().find(|f| f.name == name)
    }
}

fn opt<T>(v: Option<T>, f: impl FnOnce(T) -> CellValue) -> CellValue {
    v.map(f).unwrap_or(CellValue::Missing)
}

fn message(v: &Option<serde_json::Value>) -> CellValue {
    match v {
        None | Some(serde_json::Value::Null) => CellValue::Missing,
        Some(serde_json::Value::String(s)) => CellValue::Text(s.clone()),
        Some(v) => CellValue::Json(v.clone()),
    }
}

impl Record for Thread {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, column_id: &str) -> CellValue {
        match column_id {
            "id" => CellValue::Text(self.id.clone()),
            "first_message" => message(&self.first_message),
            "last_message" => message(&self.last_message),
            "number_of_messages" => opt(self.number_of_messages, |n| CellValue::Integer(n as i64)),
            "status" => CellValue::Status(self.status.label().to_string()),
            "total_estimated_cost" => opt(self.total_estimated_cost, CellValue::Cost),
            "created_at" => opt(self.created_at, CellValue::Time),
            "last_updated_at" => opt(self.last_updated_at, CellValue::Time),
            "start_time" => opt(self.start_time, CellValue::Time),
            "end_time" => opt(self.end_time, CellValue::Time),
            "duration" => opt(self.duration, CellValue::DurationMs),
            "created_by" => opt(self.created_by.clone(), CellValue::Text),
            "comments" if self.comments.is_empty() => CellValue::Missing,
            "comments" => CellValue::List(self.comments.iter().map(|c| c.text.clone()).collect()),
            "tags" if self.tags.is_empty() => CellValue::Missing,
            "tags" => CellValue::List(self.tags.clone()),
            COLUMN_FEEDBACK_SCORES_ID => CellValue::Scores(
                self.feedback_scores
                    .iter()
                    .map(|f| (f.name.clone(), f.value))
                    .collect(),
            ),
            other => {
                if let Some(name) = other
                    .strip_prefix(COLUMN_FEEDBACK_SCORES_ID)
                    .and_then(|rest| rest.strip_prefix('.'))
                {
                    return opt(self.feedback_score(name), |f| CellValue::Number(f.value));
                }
                if let Some(field) = other
                    .strip_prefix(COLUMN_USAGE_ID)
                    .and_then(|rest| rest.strip_prefix('.'))
                {
                    let usage = self.usage.as_ref();
                    let tokens = match field {
                        "total_tokens" => usage.and_then(|u| u.total_tokens),
                        "prompt_tokens" => usage.and_then(|u| u.prompt_tokens),
                        "completion_tokens" => usage.and_then(|u| u.completion_tokens),
                        _ => None,
                    };
                    return opt(tokens, |n| CellValue::Integer(n as i64));
                }
                CellValue::Missing
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Thread {
        serde_json::from_str(
            r#"{
                "id": "t-1",
                "first_message": {"input": "hi"},
                "last_message": "bye",
                "number_of_messages": 4,
                "status": "inactive",
                "usage": {"total_tokens": 1200},
                "total_estimated_cost": 0.0042,
                "created_at": "2025-03-14T09:26:00Z",
                "duration": 1500.0,
                "tags": ["prod"],
                "feedback_scores": [{"name": "accuracy", "value": 0.75}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_thread_values() {
        let t = sample();
        assert_eq!(t.id(), "t-1");
        assert_eq!(t.value("number_of_messages"), CellValue::Integer(4));
        assert_eq!(t.value("status"), CellValue::Status("Inactive".into()));
        assert_eq!(t.value("usage.total_tokens"), CellValue::Integer(1200));
        assert_eq!(t.value("usage.prompt_tokens"), CellValue::Missing);
        assert_eq!(t.value("last_message"), CellValue::Text("bye".into()));
        assert!(matches!(t.value("first_message"), CellValue::Json(_)));
        assert_eq!(t.value("duration"), CellValue::DurationMs(1500.0));
        assert_eq!(t.value("tags"), CellValue::List(vec!["prod".into()]));
        assert_eq!(t.value("comments"), CellValue::Missing);
        assert_eq!(t.value("end_time"), CellValue::Missing);
        assert_eq!(t.value("no_such_column"), CellValue::Missing);
    }

    #[test]
    fn test_thread_feedback_score_columns() {
        let t = sample();
        assert_eq!(t.value("feedback_scores.accuracy"), CellValue::Number(0.75));
        assert_eq!(t.value("feedback_scores.relevance"), CellValue::Missing);
        assert_eq!(
            t.value("feedback_scores"),
            CellValue::Scores(vec![("accuracy".into(), 0.75)])
        );
    }

    #[test]
    fn test_thread_minimal_json() {
        let t: Thread = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert_eq!(t.status, ThreadStatus::Active);
        assert!(t.feedback_scores.is_empty());
        assert_eq!(t.value("created_at"), CellValue::Missing);
    }
}
