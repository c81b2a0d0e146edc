//! Write operation tool.
//!
//! This module implements the `run_update` action: INSERT, UPDATE, DELETE or
//! DDL, committed as its own transaction.

use crate::db::SharedSession;
use crate::error::DbResult;
use crate::models::{QueryParamInput, into_values};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Input for the run_update tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunUpdateInput {
    /// SQL statement to execute (INSERT, UPDATE, DELETE, or DDL)
    pub query: String,
    /// Positional parameters bound to `?` placeholders in the query
    #[serde(default)]
    pub params: Option<Vec<QueryParamInput>>,
}

/// Output from the run_update tool.
#[derive(Debug, Clone, Serialize)]
pub struct RunUpdateOutput {
    /// Number of rows affected by the statement
    pub affected_rows: u64,
}

pub struct WriteToolHandler {
    session: SharedSession,
}

impl WriteToolHandler {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    pub async fn run_update(&self, input: RunUpdateInput) -> DbResult<RunUpdateOutput> {
        let start = Instant::now();
        let params = into_values(input.params);

        let affected_rows = {
            let mut session = self.session.lock().await;
            session.execute_write(&input.query, &params).await?
        };

        info!(
            affected_rows,
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Write operation executed"
        );

        Ok(RunUpdateOutput { affected_rows })
    }
}
