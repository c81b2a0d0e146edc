//! Connection-related data models.
//!
//! A [`ConnectionConfig`] is built once at startup and handed to the session;
//! nothing mutates it afterwards.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_DATABASE: &str = "mcpsw";

/// Supported database types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Includes MariaDB
    #[default]
    #[value(name = "mysql")]
    MySQL,
    #[value(name = "sqlite")]
    SQLite,
}

impl DatabaseType {
    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }

    /// Character used to quote identifiers in this dialect.
    pub fn identifier_quote(&self) -> char {
        match self {
            Self::MySQL => '`',
            Self::SQLite => '"',
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Configuration for the single database connection.
///
/// For SQLite, `database` is the path of the database file and the network
/// fields are ignored.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub db_type: DatabaseType,
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Contains sensitive data - never log
    pub password: String,
    pub database: String,
}

impl ConnectionConfig {
    /// Create a MySQL connection configuration.
    pub fn mysql(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            db_type: DatabaseType::MySQL,
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.into(),
        }
    }

    /// Create a SQLite configuration pointing at a database file.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            db_type: DatabaseType::SQLite,
            host: String::new(),
            port: 0,
            user: String::new(),
            password: String::new(),
            database: path.into(),
        }
    }

    /// Human-readable target, safe to log.
    pub fn display_target(&self) -> String {
        match self.db_type {
            DatabaseType::MySQL => {
                format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
            }
            DatabaseType::SQLite => self.database.clone(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::mysql(DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USER, "", DEFAULT_DATABASE)
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"****")
            .field("database", &self.database)
            .finish()
    }
}
