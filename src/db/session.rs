//! Database session.
//!
//! A [`Session`] owns exactly one physical connection for the lifetime of the
//! process. Every operation first makes sure that connection is alive and
//! transparently reconnects when it is not. Writes run inside an explicit
//! transaction that is rolled back on any failure.

use crate::db::backend::{Backend, Connector, SqlxConnector};
use crate::db::params::positional_sql;
use crate::db::schema;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnDescriptor, ConnectionConfig, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_QUERY_TIMEOUT_SECS,
    Row, Value,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Message returned when a table name is missing or blank.
pub const TABLE_NAME_REQUIRED: &str = "Table name is required";

/// Session shared between concurrently dispatched tool calls. Holding the
/// lock for a whole operation serializes access to the one connection.
pub type SharedSession = Arc<Mutex<Session>>;

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Disconnected,
    Connected,
}

enum SessionState {
    Disconnected,
    Connected(Box<dyn Backend>),
}

pub struct Session {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    state: SessionState,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl Session {
    /// Create a disconnected session using the sqlx driver.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_connector(config, Arc::new(SqlxConnector))
    }

    /// Create a disconnected session with a custom connector.
    pub fn with_connector(config: ConnectionConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            state: SessionState::Disconnected,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS as u64),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS as u64),
        }
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, query_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.query_timeout = query_timeout;
        self
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Name of the configured database (the file path for SQLite).
    pub fn database(&self) -> &str {
        &self.config.database
    }

    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Disconnected => SessionStatus::Disconnected,
            SessionState::Connected(_) => SessionStatus::Connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status() == SessionStatus::Connected
    }

    /// Open a connection, closing any connection already held.
    pub async fn connect(&mut self) -> DbResult<()> {
        self.close().await;

        let target = self.config.display_target();
        let attempt = timeout(self.connect_timeout, self.connector.connect(&self.config)).await;
        match attempt {
            Ok(Ok(backend)) => {
                info!(
                    db_type = %backend.db_type(),
                    target = %target,
                    "Connected to database"
                );
                self.state = SessionState::Connected(backend);
                Ok(())
            }
            Ok(Err(e)) => {
                error!(target = %target, error = %e, "Failed to connect to database");
                Err(connect_error(e))
            }
            Err(_) => {
                error!(target = %target, "Timed out connecting to database");
                Err(timeout_error("connect", self.connect_timeout))
            }
        }
    }

    /// Close the connection if one is held. Safe to call repeatedly.
    pub async fn close(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Disconnected);
        if let SessionState::Connected(backend) = state {
            match backend.close().await {
                Ok(()) => info!("Database connection closed"),
                Err(e) => warn!(error = %e, "Error while closing database connection"),
            }
        }
    }

    /// Run a statement and return every row it produces.
    pub async fn execute_read(&mut self, query: &str, params: &[Value]) -> DbResult<Vec<Row>> {
        let limit = self.query_timeout;
        let backend = self.ensure_connected().await?;

        debug!(sql = %query, params = params.len(), "Executing read");
        let statement = positional_sql(query, params);
        let outcome = timeout(limit, backend.fetch_all(&statement, params)).await;
        match outcome {
            Ok(Ok(rows)) => Ok(rows),
            Ok(Err(e)) => {
                error!(sql = %query, params = ?params, error = %e, "Query failed");
                Err(DbError::query(e, query, params))
            }
            Err(_) => {
                self.discard_connection("query timed out");
                Err(timeout_error("query execution", limit))
            }
        }
    }

    /// Run a statement inside its own transaction and return the number of
    /// affected rows. Any failure rolls the transaction back before the
    /// original error is returned.
    pub async fn execute_write(&mut self, query: &str, params: &[Value]) -> DbResult<u64> {
        let limit = self.query_timeout;
        let backend = self.ensure_connected().await?;

        debug!(sql = %query, params = params.len(), "Executing write");
        let statement = positional_sql(query, params);
        let outcome = timeout(
            limit,
            write_in_transaction(backend.as_mut(), &statement, params),
        )
        .await;
        match outcome {
            Ok(Ok(affected)) => Ok(affected),
            Ok(Err(e)) => {
                error!(sql = %query, params = ?params, error = %e, "Write failed, rolling back");
                self.rollback_after_failure(limit).await;
                Err(DbError::query(e, query, params))
            }
            Err(_) => {
                // the statement may still be running; dropping the
                // connection aborts the open transaction server-side
                self.discard_connection("write timed out");
                Err(timeout_error("write operation", limit))
            }
        }
    }

    /// Names of all tables in the configured database, in store order.
    pub async fn list_tables(&mut self) -> DbResult<Vec<String>> {
        let sql = schema::list_tables_sql(self.config.db_type, &self.config.database);
        let rows = self.execute_read(&sql, &[]).await?;
        rows.iter().map(table_name_of).collect()
    }

    /// Column metadata for `table_name`, ordered by ordinal position.
    pub async fn describe_table(&mut self, table_name: &str) -> DbResult<Vec<ColumnDescriptor>> {
        if table_name.trim().is_empty() {
            return Err(DbError::validation(TABLE_NAME_REQUIRED));
        }

        let describe = schema::describe_table_sql(self.config.db_type);
        let mut params = Vec::with_capacity(2);
        if describe.binds_schema {
            params.push(Value::Text(self.config.database.clone()));
        }
        params.push(Value::Text(table_name.to_string()));

        let rows = self.execute_read(describe.sql, &params).await?;
        rows.iter().map(ColumnDescriptor::from_row).collect()
    }

    /// The first `limit` rows of `table_name`.
    ///
    /// The name is used as a quoted identifier, so callers should only pass
    /// names obtained from [`Session::list_tables`].
    pub async fn sample_rows(&mut self, table_name: &str, limit: u32) -> DbResult<Vec<Row>> {
        if table_name.trim().is_empty() {
            return Err(DbError::validation(TABLE_NAME_REQUIRED));
        }
        let sql = schema::sample_rows_sql(self.config.db_type, table_name, limit);
        self.execute_read(&sql, &[]).await
    }

    async fn ensure_connected(&mut self) -> DbResult<&mut Box<dyn Backend>> {
        let live = match &mut self.state {
            SessionState::Connected(backend) => backend.is_live().await,
            SessionState::Disconnected => false,
        };

        if !live {
            warn!("Connection lost. Reconnecting...");
            // a dead link is dropped rather than closed
            self.state = SessionState::Disconnected;
            self.connect().await?;
        }

        match &mut self.state {
            SessionState::Connected(backend) => Ok(backend),
            SessionState::Disconnected => Err(DbError::internal(
                "Session is not connected after a successful connect",
            )),
        }
    }

    async fn rollback_after_failure(&mut self, limit: Duration) {
        let SessionState::Connected(backend) = &mut self.state else {
            return;
        };
        let outcome = timeout(limit, backend.rollback()).await;
        match outcome {
            Ok(Ok(())) => debug!("Rolled back failed write"),
            Ok(Err(e)) => {
                warn!(error = %e, "Rollback failed");
                self.discard_connection("rollback failed");
            }
            Err(_) => self.discard_connection("rollback timed out"),
        }
    }

    fn discard_connection(&mut self, reason: &str) {
        if self.is_connected() {
            warn!(reason, "Discarding database connection");
        }
        self.state = SessionState::Disconnected;
    }
}

async fn write_in_transaction(
    backend: &mut dyn Backend,
    query: &str,
    params: &[Value],
) -> Result<u64, sqlx::Error> {
    backend.begin().await?;
    let affected = backend.execute(query, params).await?;
    backend.commit().await?;
    Ok(affected)
}

fn table_name_of(row: &Row) -> DbResult<String> {
    let value = row
        .get("TABLE_NAME")
        .or_else(|| row.iter().next().map(|(_, v)| v));
    match value {
        Some(Value::Text(name)) => Ok(name.clone()),
        Some(Value::Bytes(bytes)) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        _ => Err(DbError::internal("Table listing returned a row without a name")),
    }
}

/// Connect failures always surface as connection errors.
fn connect_error(err: sqlx::Error) -> DbError {
    match DbError::from(err) {
        e @ DbError::Connection { .. } => e,
        other => DbError::connection(
            other.to_string(),
            "Check that the database server is reachable and the credentials are valid",
        ),
    }
}

fn timeout_error(operation: &str, limit: Duration) -> DbError {
    DbError::timeout(operation, limit.as_secs() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_session() -> (Session, tempfile::NamedTempFile) {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().to_string();
        (Session::new(ConnectionConfig::sqlite(path)), file)
    }

    #[tokio::test]
    async fn test_new_session_is_disconnected() {
        let (session, file) = sqlite_session();
        assert_eq!(session.status(), SessionStatus::Disconnected);
        assert_eq!(session.database(), file.path().to_string_lossy());
    }

    #[tokio::test]
    async fn test_blank_table_name_rejected_without_connecting() {
        let (mut session, _file) = sqlite_session();
        for name in ["", "   "] {
            let err = session.describe_table(name).await.unwrap_err();
            assert_eq!(err.to_string(), TABLE_NAME_REQUIRED);
        }
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_read_connects_lazily() {
        let (mut session, _file) = sqlite_session();
        let rows = session.execute_read("SELECT 1 AS one", &[]).await.unwrap();
        assert_eq!(rows[0].get("one"), Some(&Value::Int(1)));
        assert!(session.is_connected());
        session.close().await;
        session.close().await;
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_query_error_carries_statement() {
        let (mut session, _file) = sqlite_session();
        let err = session
            .execute_read("SELECT * FROM missing WHERE id = ?", &[Value::Int(3)])
            .await
            .unwrap_err();
        match err {
            DbError::Query { query, params, .. } => {
                assert_eq!(query, "SELECT * FROM missing WHERE id = ?");
                assert_eq!(params, vec![Value::Int(3)]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
