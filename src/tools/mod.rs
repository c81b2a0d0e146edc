//! MCP tool implementations.
//!
//! This module contains the database tool handlers and the gateway that
//! exposes them:
//! - `run_query`: Execute a statement and return its rows
//! - `run_update`: Execute a write statement in its own transaction
//! - `list_tables`: List tables in the configured database
//! - `describe_table`: Get a table's column metadata
//! - `describe_database`: Schema plus sample rows for every table

pub mod envelope;
pub mod gateway;
pub mod query;
pub mod schema;
pub mod write;

pub use envelope::Envelope;
pub use gateway::Gateway;
pub use query::{QueryToolHandler, RunQueryInput, RunQueryOutput};
pub use schema::{
    DescribeDatabaseOutput, DescribeTableInput, DescribeTableOutput, ListTablesOutput,
    SchemaToolHandler,
};
pub use write::{RunUpdateInput, RunUpdateOutput, WriteToolHandler};
