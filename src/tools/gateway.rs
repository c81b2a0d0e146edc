//! Tool gateway.
//!
//! The five actions exposed to callers. Each one delegates to a handler and
//! folds any error into an `{error}` envelope, so no fault escapes as a
//! protocol failure.

use crate::db::SharedSession;
use crate::tools::envelope::Envelope;
use crate::tools::query::{QueryToolHandler, RunQueryInput, RunQueryOutput};
use crate::tools::schema::{
    DescribeDatabaseOutput, DescribeTableInput, DescribeTableOutput, ListTablesOutput,
    SchemaToolHandler,
};
use crate::tools::write::{RunUpdateInput, RunUpdateOutput, WriteToolHandler};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Gateway {
    query_handler: Arc<QueryToolHandler>,
    write_handler: Arc<WriteToolHandler>,
    schema_handler: Arc<SchemaToolHandler>,
}

impl Gateway {
    pub fn new(session: SharedSession) -> Self {
        Self {
            query_handler: Arc::new(QueryToolHandler::new(session.clone())),
            write_handler: Arc::new(WriteToolHandler::new(session.clone())),
            schema_handler: Arc::new(SchemaToolHandler::new(session)),
        }
    }

    pub async fn run_query(&self, input: RunQueryInput) -> Envelope<RunQueryOutput> {
        info!(query = %input.query, "run_query");
        Envelope::from_result("run_query", self.query_handler.run_query(input).await)
    }

    pub async fn run_update(&self, input: RunUpdateInput) -> Envelope<RunUpdateOutput> {
        info!(query = %input.query, "run_update");
        Envelope::from_result("run_update", self.write_handler.run_update(input).await)
    }

    pub async fn list_tables(&self) -> Envelope<ListTablesOutput> {
        info!("list_tables");
        Envelope::from_result("list_tables", self.schema_handler.list_tables().await)
    }

    pub async fn describe_table(&self, input: DescribeTableInput) -> Envelope<DescribeTableOutput> {
        info!(table = ?input.table_name, "describe_table");
        Envelope::from_result(
            "describe_table",
            self.schema_handler.describe_table(input).await,
        )
    }

    pub async fn describe_database(&self) -> Envelope<DescribeDatabaseOutput> {
        info!("describe_database");
        Envelope::from_result(
            "describe_database",
            self.schema_handler.describe_database().await,
        )
    }
}
