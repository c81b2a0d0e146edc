//! MySQL MCP Server Library
//!
//! Exposes one MySQL database to AI assistants through a small set of MCP
//! tools: ad-hoc queries, transactional updates and schema discovery.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::DbService;
