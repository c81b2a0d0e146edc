//! Stdio transport.
//!
//! JSON-RPC flows over stdin/stdout, so nothing else may write to stdout.
//! The database session is closed when the client hangs up or a signal
//! arrives.

use crate::db::SharedSession;
use crate::error::{DbError, DbResult};
use crate::mcp::DbService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{info, warn};

pub struct StdioTransport {
    session: SharedSession,
}

impl StdioTransport {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        let running = DbService::new(self.session.clone())
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {}", e)))?;
        info!("Serving MCP over stdio");

        let (outcome, signalled) = tokio::select! {
            result = running.waiting() => match result {
                Ok(reason) => {
                    info!(reason = ?reason, "Client disconnected");
                    (Ok(()), false)
                }
                Err(e) => {
                    warn!(error = %e, "Stdio transport error");
                    (Err(DbError::internal(format!("Stdio transport error: {}", e))), false)
                }
            },
            _ = wait_for_signal() => (Ok(()), true),
        };

        if signalled {
            // closing can block on an unresponsive server; a second signal
            // leaves without waiting
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Second signal, exiting without closing the database session");
                std::process::exit(1);
            });
        }

        self.session.lock().await.close().await;

        if signalled {
            // the stdin reader task cannot be cancelled, so the runtime would
            // never shut down on its own
            std::process::exit(0);
        }
        outcome
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}
