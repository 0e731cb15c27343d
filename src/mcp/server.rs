// MCP Server Implementation
//
// Dispatches JSON-RPC messages to the protocol handlers. The same dispatcher
// backs the stdio transport and the HTTP `POST /mcp` endpoint.

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::client::DeploymentSource;
use crate::mcp::protocol::*;

/// MCP Server for handling Model Context Protocol requests
#[derive(Clone)]
pub struct MCPServer {
    source: Arc<dyn DeploymentSource>,
}

impl MCPServer {
    pub fn new(source: Arc<dyn DeploymentSource>) -> Self {
        Self { source }
    }

    /// Handle one raw JSON-RPC message. Returns `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<Value> {
        let request: Value = match serde_json::from_str(raw) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON request: {}", e);
                return Some(error_response(&Value::Null, PARSE_ERROR, "Parse error"));
            }
        };

        self.handle_request(&request).await
    }

    /// Handle one parsed JSON-RPC message. Returns `None` for notifications,
    /// i.e. objects without an `id` member. Batches are not supported and are
    /// rejected like any other non-object message.
    pub async fn handle_request(&self, request: &Value) -> Option<Value> {
        let Some(message) = request.as_object() else {
            warn!("Rejecting non-object JSON-RPC message");
            return Some(error_response(&Value::Null, INVALID_REQUEST, "Invalid Request"));
        };

        let method = message.get("method").and_then(Value::as_str);
        let Some(id) = message.get("id") else {
            info!("Received notification: {}", method.unwrap_or(""));
            return None;
        };

        let Some(method) = method else {
            warn!("Request {} has no method", id);
            return Some(error_response(id, INVALID_REQUEST, "Invalid Request"));
        };

        let response = match method {
            "initialize" => handle_initialize(request),
            "ping" => handle_ping(request),
            "tools/list" => handle_tools_list(request),
            "tools/call" => handle_tools_call(self.source.as_ref(), request).await,
            _ => {
                error!("Unknown method: {}", method);
                error_response(id, METHOD_NOT_FOUND, "Method not found")
            }
        };

        Some(response)
    }

    /// Run the MCP server with stdio transport
    pub async fn run_stdio(&self) -> Result<()> {
        info!("Starting MCP server with stdio transport");
        let reader = tokio::io::BufReader::new(tokio::io::stdin());
        self.serve_lines(reader, tokio::io::stdout()).await
    }

    /// Serve line-delimited JSON-RPC until EOF.
    pub async fn serve_lines<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!("Received MCP message: {}", trimmed);

            if let Some(response) = self.handle_message(trimmed).await {
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
            }
        }

        info!("stdin closed, MCP server stopping");
        Ok(())
    }
}
