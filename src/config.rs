//! Configuration handling for the MySQL MCP server.
//!
//! Everything is read once at startup from CLI arguments, falling back to
//! environment variables and then to built-in defaults.

use crate::models::{
    ConnectionConfig, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DATABASE, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_USER, DatabaseType,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
pub const DEFAULT_HTTP_PORT: u16 = 8000;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for networked clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "mysql-mcp-server",
    about = "MCP server exposing a single MySQL database to AI assistants",
    version,
    author
)]
pub struct Config {
    /// Database driver. `sqlite` treats --db-name as a file path.
    #[arg(long, value_enum, default_value = "mysql", env = "DB_TYPE")]
    pub db_type: DatabaseType,

    /// Database server host
    #[arg(long, default_value = DEFAULT_HOST, env = "MYSQL_HOST")]
    pub db_host: String,

    /// Database server port
    #[arg(long, default_value_t = DEFAULT_PORT, env = "MYSQL_PORT")]
    pub db_port: u16,

    /// Database user
    #[arg(long, default_value = DEFAULT_USER, env = "MYSQL_USER")]
    pub db_user: String,

    /// Database password (sensitive - not logged)
    #[arg(long, default_value = "", env = "MYSQL_PASSWORD", hide_env_values = true)]
    pub db_password: String,

    /// Database (schema) name
    #[arg(long, default_value = DEFAULT_DATABASE, env = "MYSQL_DATABASE")]
    pub db_name: String,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "HOST")]
    pub host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "PORT")]
    pub port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(long, default_value = DEFAULT_MCP_ENDPOINT, env = "MCP_ENDPOINT")]
    pub mcp_endpoint: String,

    /// Query timeout in seconds
    #[arg(
        long,
        default_value_t = u64::from(DEFAULT_QUERY_TIMEOUT_SECS),
        env = "MCP_QUERY_TIMEOUT"
    )]
    pub query_timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value_t = u64::from(DEFAULT_CONNECT_TIMEOUT_SECS),
        env = "MCP_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Build the connection settings handed to the session.
    pub fn connection_config(&self) -> ConnectionConfig {
        match self.db_type {
            DatabaseType::MySQL => ConnectionConfig::mysql(
                &self.db_host,
                self.db_port,
                &self.db_user,
                &self.db_password,
                &self.db_name,
            ),
            DatabaseType::SQLite => ConnectionConfig::sqlite(&self.db_name),
        }
    }

    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }

    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

/// Load a `.env` file from the working directory (or a parent) into the
/// process environment. Variables that are already set keep their values.
///
/// Returns the path that was loaded, or `None` when there is no file.
pub fn load_env_file() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::MySQL,
            db_host: DEFAULT_HOST.to_string(),
            db_port: DEFAULT_PORT,
            db_user: DEFAULT_USER.to_string(),
            db_password: String::new(),
            db_name: DEFAULT_DATABASE.to_string(),
            transport: TransportMode::Stdio,
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            query_timeout: u64::from(DEFAULT_QUERY_TIMEOUT_SECS),
            connect_timeout: u64::from(DEFAULT_CONNECT_TIMEOUT_SECS),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.db_type, DatabaseType::MySQL);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.db_name, "mcpsw");
    }

    #[test]
    fn test_explicit_flags() {
        let config = Config::try_parse_from([
            "mysql-mcp-server",
            "--db-type",
            "mysql",
            "--db-host",
            "db.internal",
            "--db-port",
            "3307",
            "--db-user",
            "app",
            "--db-password",
            "s3cret",
            "--db-name",
            "shop",
            "--transport",
            "http",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--mcp-endpoint",
            "/mcp",
            "--query-timeout",
            "5",
        ])
        .unwrap();

        assert_eq!(config.transport, TransportMode::Http);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.mcp_endpoint, "/mcp");
        assert_eq!(config.query_timeout_duration(), Duration::from_secs(5));

        let conn = config.connection_config();
        assert_eq!(conn, ConnectionConfig::mysql("db.internal", 3307, "app", "s3cret", "shop"));
    }

    #[test]
    fn test_sqlite_uses_name_as_path() {
        let config = Config::try_parse_from([
            "mysql-mcp-server",
            "--db-type",
            "sqlite",
            "--db-name",
            "/tmp/app.db",
        ])
        .unwrap();

        let conn = config.connection_config();
        assert_eq!(conn.db_type, DatabaseType::SQLite);
        assert_eq!(conn.database, "/tmp/app.db");
    }

    #[test]
    fn test_unknown_db_type_rejected() {
        let result = Config::try_parse_from(["mysql-mcp-server", "--db-type", "oracle"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_durations() {
        let config = Config {
            query_timeout: 60,
            connect_timeout: 15,
            ..Config::default()
        };
        assert_eq!(config.query_timeout_duration(), Duration::from_secs(60));
        assert_eq!(config.connect_timeout_duration(), Duration::from_secs(15));
    }

    #[test]
    fn test_transport_display() {
        assert_eq!(TransportMode::Stdio.to_string(), "stdio");
        assert_eq!(TransportMode::Http.to_string(), "http");
    }
}
