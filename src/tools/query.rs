//! Query execution tool.
//!
//! This module implements the `run_query` action: a single statement whose
//! rows are returned in full.

use crate::db::SharedSession;
use crate::error::DbResult;
use crate::models::{QueryParamInput, Row, into_values};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Input for the run_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunQueryInput {
    /// SQL statement to execute, typically a SELECT
    pub query: String,
    /// Positional parameters bound to `?` placeholders in the query
    #[serde(default)]
    pub params: Option<Vec<QueryParamInput>>,
}

/// Output from the run_query tool.
#[derive(Debug, Clone, Serialize)]
pub struct RunQueryOutput {
    /// Result rows as column-name to value maps, in column order
    pub results: Vec<Row>,
    /// Number of rows returned
    pub row_count: usize,
}

pub struct QueryToolHandler {
    session: SharedSession,
}

impl QueryToolHandler {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    pub async fn run_query(&self, input: RunQueryInput) -> DbResult<RunQueryOutput> {
        let start = Instant::now();
        let params = into_values(input.params);

        let results = {
            let mut session = self.session.lock().await;
            session.execute_read(&input.query, &params).await?
        };
        let row_count = results.len();

        info!(
            row_count,
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Query executed"
        );

        Ok(RunQueryOutput { results, row_count })
    }
}
