//! MySQL MCP Server - Main entry point.
//!
//! Connects to the configured database once at startup and serves the MCP
//! tools over stdio or streamable HTTP until shutdown.

use clap::Parser;
use mysql_mcp_server::config::{Config, TransportMode, load_env_file};
use mysql_mcp_server::db::Session;
use mysql_mcp_server::error::DbResult;
use mysql_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber. Logs go to stderr because stdout
/// carries the stdio protocol stream.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn serve(transport: impl Transport) -> DbResult<()> {
    info!(transport = transport.name(), "Serving MCP tools");
    transport.run().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // must happen before parsing so the file can feed env-backed arguments
    let env_file = load_env_file();
    let config = Config::parse();

    init_tracing(&config);

    match env_file {
        Ok(Some(path)) => info!(path = %path.display(), "Loaded environment file"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Ignoring unreadable .env file"),
    }

    info!(
        transport = %config.transport,
        "Starting MySQL MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let connection = config.connection_config();
    info!(
        db_type = %connection.db_type,
        target = %connection.display_target(),
        "Connecting to database"
    );

    let mut session = Session::new(connection).with_timeouts(
        config.connect_timeout_duration(),
        config.query_timeout_duration(),
    );
    if let Err(e) = session.connect().await {
        error!(error = %e, "Initial database connection failed");
        return Err(e.into());
    }
    let session = session.into_shared();

    let result = match config.transport {
        TransportMode::Stdio => serve(StdioTransport::new(session)).await,
        TransportMode::Http => {
            info!(
                host = %config.host,
                port = config.port,
                endpoint = %config.mcp_endpoint,
                "HTTP listener settings"
            );
            serve(HttpTransport::new(
                session,
                &config.host,
                config.port,
                &config.mcp_endpoint,
            ))
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
