//! Schema introspection tools.
//!
//! This module implements the `list_tables`, `describe_table` and
//! `describe_database` actions.

use crate::db::{Session, SharedSession, TABLE_NAME_REQUIRED};
use crate::error::{DbError, DbResult};
use crate::models::{ColumnDescriptor, SAMPLE_ROW_LIMIT, TableSummaries, TableSummary};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Input for the describe_table tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Name of the table to describe
    #[serde(default)]
    pub table_name: Option<String>,
}

/// Output from the list_tables tool.
#[derive(Debug, Clone, Serialize)]
pub struct ListTablesOutput {
    pub tables: Vec<String>,
}

/// Output from the describe_table tool.
#[derive(Debug, Clone, Serialize)]
pub struct DescribeTableOutput {
    /// Columns in ordinal order
    pub schema: Vec<ColumnDescriptor>,
}

/// Output from the describe_database tool.
#[derive(Debug, Clone, Serialize)]
pub struct DescribeDatabaseOutput {
    pub database: String,
    /// Per-table schema and up to five sample rows, or the error that table
    /// hit, in listing order
    pub tables: TableSummaries,
}

pub struct SchemaToolHandler {
    session: SharedSession,
}

impl SchemaToolHandler {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    pub async fn list_tables(&self) -> DbResult<ListTablesOutput> {
        let tables = self.session.lock().await.list_tables().await?;
        info!(table_count = tables.len(), "Listed tables");
        Ok(ListTablesOutput { tables })
    }

    pub async fn describe_table(&self, input: DescribeTableInput) -> DbResult<DescribeTableOutput> {
        // blank names are rejected, anything else goes to the store as given
        let table_name = match input.table_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => return Err(DbError::validation(TABLE_NAME_REQUIRED)),
        };

        let schema = self.session.lock().await.describe_table(&table_name).await?;
        info!(table = %table_name, column_count = schema.len(), "Described table");
        Ok(DescribeTableOutput { schema })
    }

    /// Summarize every table: its schema plus a handful of sample rows.
    ///
    /// The session lock is held for the whole walk so the summary reflects
    /// one uninterrupted sequence of reads. A failure on one table is
    /// recorded in that table's entry; only a failure to list the tables
    /// fails the whole call.
    pub async fn describe_database(&self) -> DbResult<DescribeDatabaseOutput> {
        let mut session = self.session.lock().await;
        let table_names = session.list_tables().await?;

        let mut tables = TableSummaries::with_capacity(table_names.len());
        for name in table_names {
            let summary = summarize_table(&mut session, &name).await;
            if let TableSummary::Failed { error } = &summary {
                warn!(table = %name, error = %error, "Failed to summarize table");
            }
            tables.insert(name, summary);
        }

        info!(
            database = %session.database(),
            table_count = tables.len(),
            "Described database"
        );

        Ok(DescribeDatabaseOutput {
            database: session.database().to_string(),
            tables,
        })
    }
}

/// `name` must come from `Session::list_tables`; it is used as an identifier.
async fn summarize_table(session: &mut Session, name: &str) -> TableSummary {
    let schema = match session.describe_table(name).await {
        Ok(schema) => schema,
        Err(e) => {
            return TableSummary::Failed {
                error: e.to_string(),
            };
        }
    };
    match session.sample_rows(name, SAMPLE_ROW_LIMIT).await {
        Ok(sample_data) => TableSummary::Described {
            schema,
            sample_data,
        },
        Err(e) => TableSummary::Failed {
            error: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionConfig;

    fn handler() -> SchemaToolHandler {
        let session = Session::new(ConnectionConfig::sqlite(":memory:")).into_shared();
        SchemaToolHandler::new(session)
    }

    #[test]
    fn test_describe_table_input_defaults() {
        let input: DescribeTableInput = serde_json::from_str("{}").unwrap();
        assert!(input.table_name.is_none());
    }

    #[tokio::test]
    async fn test_describe_table_requires_name() {
        let handler = handler();
        for table_name in [None, Some(String::new()), Some("  ".to_string())] {
            let err = handler
                .describe_table(DescribeTableInput { table_name })
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), TABLE_NAME_REQUIRED);
        }
        assert!(!handler.session.lock().await.is_connected());
    }

    #[test]
    fn test_describe_database_output_serialization() {
        let mut tables = TableSummaries::default();
        tables.insert(
            "broken",
            TableSummary::Failed {
                error: "boom".to_string(),
            },
        );
        let output = DescribeDatabaseOutput {
            database: "shop".to_string(),
            tables,
        };
        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            serde_json::json!({"database": "shop", "tables": {"broken": {"error": "boom"}}})
        );
    }
}
