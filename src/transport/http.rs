//! Streamable HTTP transport.
//!
//! Each MCP client session gets its own [`DbService`], and every one of them
//! talks to the same database session. The database connection is closed
//! once the listener has stopped, whichever way it stopped.

use crate::db::SharedSession;
use crate::error::{DbError, DbResult};
use crate::mcp::DbService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// How long open client streams may hold the process after the first signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpTransport {
    session: SharedSession,
    host: String,
    port: u16,
    endpoint: String,
}

impl HttpTransport {
    /// `endpoint` is the path the MCP service is mounted at; `/` serves it
    /// from every path.
    pub fn new(
        session: SharedSession,
        host: impl Into<String>,
        port: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            session,
            host: host.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn router(&self) -> axum::Router {
        let session = self.session.clone();
        let service = StreamableHttpService::new(
            move || Ok(DbService::new(session.clone())),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // axum refuses to nest a service at "/"
        if self.endpoint == "/" {
            axum::Router::new().fallback_service(service)
        } else {
            axum::Router::new().nest_service(&self.endpoint, service)
        }
    }

    /// Serve until the listener fails, finishes draining, or the drain is
    /// cut short by a timeout or a second signal.
    async fn serve(&self, listener: TcpListener) -> DbResult<()> {
        let first_signal = Arc::new(Notify::new());
        let notify = first_signal.clone();
        let graceful = axum::serve(listener, self.router()).with_graceful_shutdown(async move {
            wait_for_signal().await;
            notify.notify_one();
        });

        tokio::select! {
            result = graceful => result.map_err(|e| {
                error!(error = %e, "HTTP server error");
                DbError::internal(format!("HTTP server error: {}", e))
            }),
            _ = async {
                first_signal.notified().await;
                info!(
                    timeout_secs = DRAIN_TIMEOUT.as_secs(),
                    "Draining client streams (send signal again to stop now)"
                );
                tokio::select! {
                    _ = tokio::time::sleep(DRAIN_TIMEOUT) => warn!("Drain timed out"),
                    _ = wait_for_signal() => warn!("Second signal, skipping drain"),
                }
            } => Ok(()),
        }
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> DbResult<()> {
        let bind_addr = self.bind_addr();
        let outcome = match TcpListener::bind(&bind_addr).await {
            Ok(listener) => {
                info!(addr = %bind_addr, endpoint = %self.endpoint, "Listening for MCP clients");
                self.serve(listener).await
            }
            Err(e) => Err(DbError::connection(
                format!("Failed to bind to {}: {}", bind_addr, e),
                "Check that the port is available",
            )),
        };
        if outcome.is_ok() {
            info!("HTTP listener stopped");
        }

        self.session.lock().await.close().await;
        outcome
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
