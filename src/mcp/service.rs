//! MCP service implementation using rmcp.
//!
//! `DbService` publishes the gateway's five actions as MCP tools. Every
//! action answers with a JSON envelope: success payloads come back as a
//! normal tool result, `{error}` envelopes as an error tool result carrying
//! the same JSON.

use crate::db::SharedSession;
use crate::tools::{DescribeTableInput, Envelope, Gateway, RunQueryInput, RunUpdateInput};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router,
};
use serde::Serialize;

#[derive(Clone)]
pub struct DbService {
    gateway: Gateway,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl DbService {
    pub fn new(session: SharedSession) -> Self {
        Self {
            gateway: Gateway::new(session),
            tool_router: Self::tool_router(),
        }
    }
}

/// Serialize an envelope into a tool result.
fn into_tool_result<T: Serialize>(envelope: Envelope<T>) -> Result<CallToolResult, McpError> {
    let success = envelope.is_success();
    let content = vec![Content::json(&envelope)?];
    if success {
        Ok(CallToolResult::success(content))
    } else {
        Ok(CallToolResult::error(content))
    }
}

#[tool_router]
impl DbService {
    #[tool(
        description = "Execute a SQL query and return all resulting rows.\nUse `?` placeholders with `params` for caller-supplied values.\nReturns {results, row_count} or {error}."
    )]
    async fn run_query(
        &self,
        Parameters(input): Parameters<RunQueryInput>,
    ) -> Result<CallToolResult, McpError> {
        into_tool_result(self.gateway.run_query(input).await)
    }

    #[tool(
        description = "Execute an INSERT, UPDATE, DELETE or DDL statement in its own transaction.\nUse `?` placeholders with `params` for caller-supplied values.\nThe statement is rolled back on failure.\nReturns {affected_rows} or {error}."
    )]
    async fn run_update(
        &self,
        Parameters(input): Parameters<RunUpdateInput>,
    ) -> Result<CallToolResult, McpError> {
        into_tool_result(self.gateway.run_update(input).await)
    }

    #[tool(description = "List all tables in the configured database.\nReturns {tables} or {error}.")]
    async fn list_tables(&self) -> Result<CallToolResult, McpError> {
        into_tool_result(self.gateway.list_tables().await)
    }

    #[tool(
        description = "Get column metadata for a table: name, data type, full column type, nullability, key, default and extra.\nReturns {schema} or {error}."
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<CallToolResult, McpError> {
        into_tool_result(self.gateway.describe_table(input).await)
    }

    #[tool(
        description = "Summarize the whole database: every table's schema plus up to 5 sample rows.\nA table that cannot be read gets its own {error} entry.\nReturns {database, tables} or {error}."
    )]
    async fn describe_database(&self) -> Result<CallToolResult, McpError> {
        into_tool_result(self.gateway.describe_database().await)
    }
}

#[tool_handler]
impl ServerHandler for DbService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mysql-mcp-server".to_owned(),
                title: Some("MySQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Tools for querying a single MySQL database.\n\
                \n\
                ## Workflow\n\
                1. Call `describe_database` (or `list_tables` + `describe_table`) to learn the schema\n\
                2. Use `run_query` for reads and `run_update` for writes\n\
                \n\
                ## Parameters\n\
                Pass caller-supplied values through `params` and reference them with `?` placeholders.\n\
                \n\
                ## Errors\n\
                Every tool returns either its result or an object with a single `error` field."
                    .to_string(),
            ),
        }
    }
}
