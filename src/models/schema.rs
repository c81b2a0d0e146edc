//! Schema-related data models.
//!
//! These types are produced only by schema introspection.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{DbError, DbResult};
use crate::models::query::{Row, Value};

/// Structured metadata for one table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Base type, e.g. "varchar"
    pub data_type: String,
    /// Full declared type, e.g. "varchar(255)"
    pub column_type: String,
    pub nullable: bool,
    /// "PRI", "UNI", "MUL" or empty
    pub key: String,
    pub default_value: Option<String>,
    /// e.g. "auto_increment"
    pub extra: String,
}

impl ColumnDescriptor {
    /// Build a descriptor from one introspection row.
    ///
    /// The row must expose the INFORMATION_SCHEMA.COLUMNS names
    /// (`COLUMN_NAME`, `DATA_TYPE`, `COLUMN_TYPE`, `IS_NULLABLE`,
    /// `COLUMN_KEY`, `COLUMN_DEFAULT`, `EXTRA`); the SQLite query aliases its
    /// pragma output to the same names.
    pub fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            name: required_text(row, "COLUMN_NAME")?,
            data_type: optional_text(row, "DATA_TYPE").unwrap_or_default(),
            column_type: optional_text(row, "COLUMN_TYPE").unwrap_or_default(),
            nullable: optional_text(row, "IS_NULLABLE")
                .map(|v| v.eq_ignore_ascii_case("YES"))
                .unwrap_or(true),
            key: optional_text(row, "COLUMN_KEY").unwrap_or_default(),
            default_value: optional_text(row, "COLUMN_DEFAULT"),
            extra: optional_text(row, "EXTRA").unwrap_or_default(),
        })
    }
}

fn optional_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::Text(s) => Some(s.clone()),
        Value::Int(v) => Some(v.to_string()),
        Value::Float(v) => Some(v.to_string()),
        Value::Bool(v) => Some(v.to_string()),
        Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}

fn required_text(row: &Row, column: &str) -> DbResult<String> {
    optional_text(row, column)
        .ok_or_else(|| DbError::internal(format!("Introspection row is missing {}", column)))
}

/// Per-table entry of the whole-database summary.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TableSummary {
    Described {
        schema: Vec<ColumnDescriptor>,
        sample_data: Vec<Row>,
    },
    Failed {
        error: String,
    },
}

/// Table summaries keyed by name, kept in the order the tables were listed.
/// Serializes as a JSON object.
#[derive(Debug, Clone, Default)]
pub struct TableSummaries {
    entries: Vec<(String, TableSummary)>,
}

impl TableSummaries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn get(&self, table: &str) -> Option<&TableSummary> {
        self.entries
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, summary)| summary)
    }

    /// Add an entry, replacing an earlier one with the same name in place.
    pub fn insert(&mut self, table: impl Into<String>, summary: TableSummary) {
        let table = table.into();
        match self.entries.iter_mut().find(|(name, _)| *name == table) {
            Some((_, existing)) => *existing = summary,
            None => self.entries.push((table, summary)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableSummary)> {
        self.entries
            .iter()
            .map(|(name, summary)| (name.as_str(), summary))
    }
}

impl Serialize for TableSummaries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, summary) in &self.entries {
            map.serialize_entry(name, summary)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_row() -> Row {
        [
            ("COLUMN_NAME", Value::from("id")),
            ("DATA_TYPE", Value::from("int")),
            ("COLUMN_TYPE", Value::from("int unsigned")),
            ("IS_NULLABLE", Value::from("NO")),
            ("COLUMN_KEY", Value::from("PRI")),
            ("COLUMN_DEFAULT", Value::Null),
            ("EXTRA", Value::from("auto_increment")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_descriptor_from_row() {
        let column = ColumnDescriptor::from_row(&column_row()).unwrap();
        assert_eq!(column.name, "id");
        assert_eq!(column.column_type, "int unsigned");
        assert!(!column.nullable);
        assert_eq!(column.key, "PRI");
        assert_eq!(column.default_value, None);
        assert_eq!(column.extra, "auto_increment");
    }

    #[test]
    fn test_descriptor_numeric_default() {
        let mut row = column_row();
        row.insert("COLUMN_DEFAULT", Value::Int(0));
        let column = ColumnDescriptor::from_row(&row).unwrap();
        assert_eq!(column.default_value.as_deref(), Some("0"));
    }

    #[test]
    fn test_descriptor_missing_name() {
        let row: Row = [("DATA_TYPE", Value::from("int"))].into_iter().collect();
        assert!(matches!(
            ColumnDescriptor::from_row(&row),
            Err(DbError::Internal { .. })
        ));
    }

    #[test]
    fn test_summary_serialization() {
        let failed = TableSummary::Failed {
            error: "boom".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({"error": "boom"})
        );
        let described = TableSummary::Described {
            schema: vec![],
            sample_data: vec![],
        };
        assert_eq!(
            serde_json::to_value(&described).unwrap(),
            serde_json::json!({"schema": [], "sample_data": []})
        );
    }

    #[test]
    fn test_summaries_keep_insertion_order() {
        let failed = |msg: &str| TableSummary::Failed {
            error: msg.to_string(),
        };
        let mut tables = TableSummaries::default();
        assert!(tables.is_empty());
        tables.insert("zebra", failed("z"));
        tables.insert("apple", failed("a"));
        tables.insert("zebra", failed("z2"));

        assert_eq!(tables.len(), 2);
        assert_eq!(tables.names().collect::<Vec<_>>(), vec!["zebra", "apple"]);
        assert!(matches!(
            tables.get("zebra"),
            Some(TableSummary::Failed { error }) if error == "z2"
        ));
        assert!(tables.get("missing").is_none());
        assert_eq!(
            serde_json::to_string(&tables).unwrap(),
            r#"{"zebra":{"error":"z2"},"apple":{"error":"a"}}"#
        );
    }
}
