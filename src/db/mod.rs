//! Database access layer.
//!
//! This module provides:
//! - The physical connection traits and their sqlx implementation
//! - The single-connection session with reconnect and rollback handling
//! - Schema introspection SQL
//! - Parameter binding and type mappings

pub mod backend;
#[macro_use]
pub mod macros;
pub mod params;
pub mod schema;
pub mod session;
pub mod types;

pub use backend::{Backend, Connector, SqlxBackend, SqlxConnector};
pub use session::{Session, SessionStatus, SharedSession, TABLE_NAME_REQUIRED};
