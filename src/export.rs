//! Export of selected rows.
//!
//! Exported columns are the materialized ones (selected plus pinned, in
//! display order) without the row-selection column. Values are written raw,
//! not as rendered cells: no truncation, timestamps in RFC 3339.

use std::collections::HashSet;
use std::io::{self, Write};

use chrono::SecondsFormat;

use crate::column::catalog::COLUMN_SELECT_ID;
use crate::materialize::MaterializedColumn;
use crate::model::{CellValue, Record};

/// Columns to export, in materialized order.
pub fn export_columns(columns: &[MaterializedColumn]) -> impl Iterator<Item = &MaterializedColumn> {
    columns.iter().filter(|c| c.id != COLUMN_SELECT_ID)
}

/// Rows chosen for export, one string per exported column.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    /// Column ids, used as the header.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    /// Builds the table for the records whose id is in `row_ids`, keeping the
    /// record order. Ids with no record are skipped.
    pub fn new<R: Record, S: AsRef<str>>(
        columns: &[MaterializedColumn],
        records: &[R],
        row_ids: &[S],
    ) -> Self {
        let columns: Vec<String> = export_columns(columns).map(|c| c.id.clone()).collect();
        let wanted: HashSet<&str> = row_ids.iter().map(|id| id.as_ref()).collect();
        let rows = records
            .iter()
            .filter(|r| wanted.contains(r.id()))
            .map(|r| columns.iter().map(|c| export_value(&r.value(c))).collect())
            .collect();
        Self { columns, rows }
    }

    /// Writes the header and rows as CSV.
    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{}", csv_line(&self.columns))?;
        for row in &self.rows {
            writeln!(out, "{}", csv_line(row))?;
        }
        out.flush()
    }
}

/// Raw text of a value for export.
pub fn export_value(value: &CellValue) -> String {
    match value {
        CellValue::Missing => String::new(),
        CellValue::Text(s) | CellValue::Status(s) => s.clone(),
        CellValue::Json(serde_json::Value::String(s)) => s.clone(),
        CellValue::Json(v) => v.to_string(),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Number(n) | CellValue::DurationMs(n) | CellValue::Cost(n) => n.to_string(),
        CellValue::Time(ts) => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        CellValue::List(items) => items.join(", "),
        CellValue::Scores(scores) => scores
            .iter()
            .map(|(name, v)| format!("{}={}", name, v))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn csv_line(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_escape(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Quotes a field when it holds a separator, quote or line break.
fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColumnDescriptor, SemanticType, register};
    use crate::materialize::materialize;
    use crate::model::Thread;
    use crate::view::ViewState;
    use chrono::{TimeZone, Utc};

    fn threads() -> Vec<Thread> {
        serde_json::from_str(
            r#"[
                {"id": "t-1", "first_message": {"a": 1}, "number_of_messages": 2,
                 "created_at": "2025-03-14T09:26:00Z"},
                {"id": "t-2", "first_message": "hi, \"you\"", "number_of_messages": 5},
                {"id": "t-3", "number_of_messages": 1}
            ]"#,
        )
        .unwrap()
    }

    fn columns() -> Vec<MaterializedColumn> {
        let all = register(vec![
            ColumnDescriptor::new("id", "ID", SemanticType::String),
            ColumnDescriptor::new("first_message", "First", SemanticType::String),
            ColumnDescriptor::new("number_of_messages", "Msgs", SemanticType::Number),
            ColumnDescriptor::new("created_at", "Created", SemanticType::Time),
        ])
        .unwrap();
        let state = ViewState::with_selected(["number_of_messages", "first_message", "created_at"]);
        materialize(&all, &state, &["id"], &["select", "id"])
    }

    #[test]
    fn test_export_columns_skip_select() {
        let mut cols = columns();
        cols.insert(
            0,
            MaterializedColumn {
                id: COLUMN_SELECT_ID.into(),
                ..cols[0].clone()
            },
        );
        let ids: Vec<_> = export_columns(&cols).map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["id", "first_message", "number_of_messages", "created_at"]);
    }

    #[test]
    fn test_export_selected_rows_in_record_order() {
        let table = ExportTable::new(&columns(), &threads(), &["t-2", "t-1", "missing"]);
        assert_eq!(
            table.columns,
            vec!["id", "first_message", "number_of_messages", "created_at"]
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[0],
            vec!["t-1", r#"{"a":1}"#, "2", "2025-03-14T09:26:00Z"]
        );
        assert_eq!(table.rows[1][3], "");
    }

    #[test]
    fn test_write_csv_escapes_fields() {
        let table = ExportTable::new(&columns(), &threads(), &["t-1", "t-2"]);
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();
        assert_eq!(
            csv,
            "id,first_message,number_of_messages,created_at\n\
             t-1,\"{\"\"a\"\":1}\",2,2025-03-14T09:26:00Z\n\
             t-2,\"hi, \"\"you\"\"\",5,\n"
        );
    }

    #[test]
    fn test_export_value() {
        assert_eq!(export_value(&CellValue::Missing), "");
        assert_eq!(export_value(&CellValue::Cost(0.0042)), "0.0042");
        assert_eq!(
            export_value(&CellValue::List(vec!["a".into(), "b".into()])),
            "a, b"
        );
        assert_eq!(
            export_value(&CellValue::Scores(vec![("acc".into(), 0.5)])),
            "acc=0.5"
        );
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(export_value(&CellValue::Time(ts)), "2024-01-02T03:04:05Z");
    }
}
