//! Data models for the MySQL MCP server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{
    ConnectionConfig, DEFAULT_DATABASE, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USER, DatabaseType,
};
pub use query::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_QUERY_TIMEOUT_SECS, QueryParamInput, Row,
    SAMPLE_ROW_LIMIT, Value, into_values,
};
pub use schema::{ColumnDescriptor, TableSummaries, TableSummary};
