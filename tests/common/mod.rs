//! Shared fixtures for the integration tests.
//!
//! Tests run against a temporary SQLite file holding two tables. The
//! [`RecordingConnector`] wraps the real connector so tests can count
//! connects and statements, watch rollbacks, mark the live link as dropped,
//! and inject statement failures, rollback failures and slow statements.

#![allow(dead_code)]

use async_trait::async_trait;
use mysql_mcp_server::db::{Backend, Connector, Session, SqlxConnector};
use mysql_mcp_server::models::{ConnectionConfig, DatabaseType, Row, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const USER_COUNT: i64 = 7;

/// Temporary database file; removed when dropped.
pub struct TestDb {
    _dir: TempDir,
    pub config: ConnectionConfig,
}

/// Create a SQLite database with `users` and `orders`.
pub async fn seeded_db() -> TestDb {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fixture.db");
    let config = ConnectionConfig::sqlite(path.to_str().unwrap());

    let mut session = Session::new(config.clone());
    session.connect().await.unwrap();
    session
        .execute_write(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER)",
            &[],
        )
        .await
        .unwrap();
    session
        .execute_write(
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL, total REAL)",
            &[],
        )
        .await
        .unwrap();

    for id in 1..=USER_COUNT {
        session
            .execute_write(
                "INSERT INTO users (id, name, age) VALUES (?, ?, ?)",
                &[
                    Value::Int(id),
                    Value::Text(format!("user{}", id)),
                    Value::Int(20 + id),
                ],
            )
            .await
            .unwrap();
    }
    session
        .execute_write(
            "INSERT INTO orders (id, user_id, total) VALUES (1, 1, 9.5), (2, 3, 12.25)",
            &[],
        )
        .await
        .unwrap();
    session.close().await;

    TestDb { _dir: dir, config }
}

/// Number of rows in `users`, read through a fresh session.
pub async fn user_count(config: &ConnectionConfig) -> i64 {
    let mut session = Session::new(config.clone());
    session.connect().await.unwrap();
    let rows = session
        .execute_read("SELECT COUNT(*) AS n FROM users", &[])
        .await
        .unwrap();
    session.close().await;
    match rows[0].get("n") {
        Some(Value::Int(n)) => *n,
        other => panic!("unexpected count value: {:?}", other),
    }
}

/// Counters and injected faults shared between a [`RecordingConnector`] and
/// the backends it opens.
#[derive(Default)]
pub struct Recorder {
    pub connects: AtomicUsize,
    pub statements: AtomicUsize,
    pub rollbacks: AtomicUsize,
    stale: AtomicBool,
    fail_rollback: AtomicBool,
    failing_statement: Mutex<Option<String>>,
    delay_ms: AtomicU64,
}

impl Recorder {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> usize {
        self.statements.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    /// Make the current connection fail its next liveness check.
    pub fn drop_link(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }

    /// Make every ROLLBACK report an error without reaching the store.
    pub fn fail_rollbacks(&self) {
        self.fail_rollback.store(true, Ordering::SeqCst);
    }

    /// Fail any statement whose text contains `fragment` with [`INJECTED_FAILURE`].
    pub fn fail_statements_containing(&self, fragment: &str) {
        *self.failing_statement.lock().unwrap() = Some(fragment.to_string());
    }

    /// Hold every statement for `delay` after the store has run it.
    pub fn stall_statements(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn clear_faults(&self) {
        self.fail_rollback.store(false, Ordering::SeqCst);
        *self.failing_statement.lock().unwrap() = None;
        self.delay_ms.store(0, Ordering::SeqCst);
    }

    fn check_statement(&self, sql: &str) -> Result<(), sqlx::Error> {
        self.statements.fetch_add(1, Ordering::SeqCst);
        match self.failing_statement.lock().unwrap().as_deref() {
            Some(fragment) if sql.contains(fragment) => {
                Err(sqlx::Error::Protocol(INJECTED_FAILURE.to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn stall(&self) {
        let ms = self.delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

/// Message carried by statements failed through [`Recorder::fail_statements_containing`].
pub const INJECTED_FAILURE: &str = "injected statement failure";

pub struct RecordingConnector {
    recorder: Arc<Recorder>,
}

impl RecordingConnector {
    pub fn new() -> (Arc<Self>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let connector = Arc::new(Self {
            recorder: recorder.clone(),
        });
        (connector, recorder)
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Backend>, sqlx::Error> {
        let inner = SqlxConnector.connect(config).await?;
        self.recorder.connects.fetch_add(1, Ordering::SeqCst);
        self.recorder.stale.store(false, Ordering::SeqCst);
        Ok(Box::new(RecordingBackend {
            inner,
            recorder: self.recorder.clone(),
        }))
    }
}

struct RecordingBackend {
    inner: Box<dyn Backend>,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl Backend for RecordingBackend {
    fn db_type(&self) -> DatabaseType {
        self.inner.db_type()
    }

    async fn is_live(&mut self) -> bool {
        if self.recorder.stale.load(Ordering::SeqCst) {
            return false;
        }
        self.inner.is_live().await
    }

    async fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, sqlx::Error> {
        self.recorder.check_statement(sql)?;
        let rows = self.inner.fetch_all(sql, params).await;
        self.recorder.stall().await;
        rows
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, sqlx::Error> {
        self.recorder.check_statement(sql)?;
        let affected = self.inner.execute(sql, params).await;
        self.recorder.stall().await;
        affected
    }

    async fn begin(&mut self) -> Result<(), sqlx::Error> {
        self.inner.begin().await
    }

    async fn commit(&mut self) -> Result<(), sqlx::Error> {
        self.inner.commit().await
    }

    async fn rollback(&mut self) -> Result<(), sqlx::Error> {
        self.recorder.rollbacks.fetch_add(1, Ordering::SeqCst);
        if self.recorder.fail_rollback.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol("rollback refused".to_string()));
        }
        self.inner.rollback().await
    }

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error> {
        self.inner.close().await
    }
}

/// A connected session over `config` that reports into a recorder.
pub async fn recording_session(config: &ConnectionConfig) -> (Session, Arc<Recorder>) {
    let (connector, recorder) = RecordingConnector::new();
    let mut session = Session::with_connector(config.clone(), connector);
    session.connect().await.unwrap();
    (session, recorder)
}
