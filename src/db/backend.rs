//! Physical connection layer.
//!
//! [`Backend`] is one open database connection; [`Connector`] opens one from a
//! [`ConnectionConfig`]. The session only talks to these traits, so tests can
//! substitute doubles that count calls or simulate a dropped link.
//!
//! # Architecture
//!
//! [`SqlxBackend`] wraps a single sqlx connection per dialect. Each dialect
//! has a submodule with the same set of functions, and the trait
//! implementation dispatches to them with `impl_backend_dispatch!`.

use crate::db::params::{bind_mysql_param, bind_sqlite_param};
use crate::db::types::IntoRow;
use crate::impl_backend_dispatch;
use crate::models::{ConnectionConfig, DatabaseType, Row, Value};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use tracing::debug;

/// One open database connection.
///
/// Errors are raw driver errors; mapping them to [`crate::error::DbError`]
/// is the session's job since only it knows the statement context.
#[async_trait]
pub trait Backend: Send {
    fn db_type(&self) -> DatabaseType;

    /// Returns false when the connection no longer answers a ping.
    async fn is_live(&mut self) -> bool;

    async fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, sqlx::Error>;

    /// Execute a statement and return the affected-row count.
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, sqlx::Error>;

    async fn begin(&mut self) -> Result<(), sqlx::Error>;

    async fn commit(&mut self) -> Result<(), sqlx::Error>;

    async fn rollback(&mut self) -> Result<(), sqlx::Error>;

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error>;
}

/// Opens connections.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Backend>, sqlx::Error>;
}

/// Connector backed by sqlx single connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlxConnector;

#[async_trait]
impl Connector for SqlxConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Backend>, sqlx::Error> {
        debug!(
            db_type = %config.db_type,
            target = %config.display_target(),
            "Opening database connection"
        );
        let backend = match config.db_type {
            DatabaseType::MySQL => {
                let mut options = MySqlConnectOptions::new()
                    .host(&config.host)
                    .port(config.port)
                    .username(&config.user)
                    .charset("utf8mb4");
                if !config.password.is_empty() {
                    options = options.password(&config.password);
                }
                if !config.database.is_empty() {
                    options = options.database(&config.database);
                }
                SqlxBackend::MySql(MySqlConnection::connect_with(&options).await?)
            }
            DatabaseType::SQLite => {
                let options = SqliteConnectOptions::new()
                    .filename(&config.database)
                    .create_if_missing(true);
                SqlxBackend::SQLite(SqliteConnection::connect_with(&options).await?)
            }
        };
        Ok(Box::new(backend))
    }
}

/// A live sqlx connection for one of the supported dialects.
#[derive(Debug)]
pub enum SqlxBackend {
    MySql(MySqlConnection),
    SQLite(SqliteConnection),
}

#[async_trait]
impl Backend for SqlxBackend {
    fn db_type(&self) -> DatabaseType {
        match self {
            Self::MySql(_) => DatabaseType::MySQL,
            Self::SQLite(_) => DatabaseType::SQLite,
        }
    }

    async fn is_live(&mut self) -> bool {
        let result = impl_backend_dispatch!(self, {
            MySql(conn) => conn.ping().await,
            SQLite(conn) => conn.ping().await,
        });
        result.is_ok()
    }

    async fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, sqlx::Error> {
        impl_backend_dispatch!(self, {
            MySql(conn) => mysql::fetch_all(conn, sql, params).await,
            SQLite(conn) => sqlite::fetch_all(conn, sql, params).await,
        })
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, sqlx::Error> {
        impl_backend_dispatch!(self, {
            MySql(conn) => mysql::execute(conn, sql, params).await,
            SQLite(conn) => sqlite::execute(conn, sql, params).await,
        })
    }

    async fn begin(&mut self) -> Result<(), sqlx::Error> {
        self.execute("BEGIN", &[]).await.map(|_| ())
    }

    async fn commit(&mut self) -> Result<(), sqlx::Error> {
        self.execute("COMMIT", &[]).await.map(|_| ())
    }

    async fn rollback(&mut self) -> Result<(), sqlx::Error> {
        self.execute("ROLLBACK", &[]).await.map(|_| ())
    }

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error> {
        match *self {
            Self::MySql(conn) => conn.close().await,
            Self::SQLite(conn) => conn.close().await,
        }
    }
}

// =============================================================================
// Dialect-Specific Implementations
// =============================================================================
//
// Statements without parameters go through the simple-query path so that
// SQL which cannot be prepared (e.g. some DDL) still runs.

mod mysql {
    use super::*;

    pub async fn fetch_all(
        conn: &mut MySqlConnection,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<Row>, sqlx::Error> {
        let rows = if params.is_empty() {
            sqlx::Executor::fetch_all(&mut *conn, sql).await?
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_mysql_param(query, param);
            }
            query.fetch_all(&mut *conn).await?
        };
        Ok(rows.into_iter().map(IntoRow::into_row).collect())
    }

    pub async fn execute(
        conn: &mut MySqlConnection,
        sql: &str,
        params: &[Value],
    ) -> Result<u64, sqlx::Error> {
        let result = if params.is_empty() {
            sqlx::Executor::execute(&mut *conn, sql).await?
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_mysql_param(query, param);
            }
            query.execute(&mut *conn).await?
        };
        Ok(result.rows_affected())
    }
}

mod sqlite {
    use super::*;

    pub async fn fetch_all(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<Row>, sqlx::Error> {
        let rows = if params.is_empty() {
            sqlx::Executor::fetch_all(&mut *conn, sql).await?
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_sqlite_param(query, param);
            }
            query.fetch_all(&mut *conn).await?
        };
        Ok(rows.into_iter().map(IntoRow::into_row).collect())
    }

    pub async fn execute(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[Value],
    ) -> Result<u64, sqlx::Error> {
        let result = if params.is_empty() {
            sqlx::Executor::execute(&mut *conn, sql).await?
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_sqlite_param(query, param);
            }
            query.execute(&mut *conn).await?
        };
        Ok(result.rows_affected())
    }
}
