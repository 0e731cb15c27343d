// MCP client for the argo-watcher MCP HTTP endpoint

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use argo_watcher_mcp::mcp::PROTOCOL_VERSION;

/// A tool as advertised by `tools/list`
#[derive(Debug, Clone, Deserialize)]
pub struct McpTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct ToolsListResult {
    #[serde(default)]
    tools: Vec<McpTool>,
}

/// JSON-RPC client talking to `POST {server}/mcp`
pub struct McpClient {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl McpClient {
    /// Create a new MCP client
    pub fn new(server_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/mcp", server_url.trim_end_matches('/')),
            next_id: AtomicU64::new(1),
        }
    }

    async fn post(&self, message: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(message)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to connect to MCP server: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("MCP server returned error {}: {}", status, body));
        }

        Ok(response)
    }

    /// Send a request and return its `result`
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let message = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });

        let response: Value = self
            .post(&message)
            .await?
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse MCP response: {}", e))?;

        if let Some(error) = response.get("error") {
            let message = error["message"].as_str().unwrap_or("unknown error");
            return Err(anyhow!("MCP error {}: {}", error["code"], message));
        }

        Ok(response["result"].clone())
    }

    async fn notify(&self, method: &str) -> Result<()> {
        let message = json!({
            "jsonrpc": "2.0",
            "method": method
        });
        self.post(&message).await?;
        Ok(())
    }

    /// Perform the initialize handshake
    pub async fn initialize(&self) -> Result<Value> {
        let result = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": "argo-watcher-chat",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            )
            .await?;
        self.notify("notifications/initialized").await?;
        Ok(result)
    }

    /// Discover the tools the server offers
    pub async fn list_tools(&self) -> Result<Vec<McpTool>> {
        let result = self.request("tools/list", json!({})).await?;
        let parsed: ToolsListResult = serde_json::from_value(result)
            .map_err(|e| anyhow!("Invalid tools/list result: {}", e))?;
        Ok(parsed.tools)
    }

    /// Execute a tool and return its output as a JSON array string
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        debug!("🤖 Calling tool {} with arguments: {}", name, arguments);
        let result = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
            .map_err(|e| anyhow!("Error executing MCP tool '{}': {}", name, e))?;
        debug!("Raw response from tool: {}", result);
        Ok(collect_tool_output(&result))
    }
}

/// Decode every text content item (as JSON where possible) into one array.
pub fn collect_tool_output(result: &Value) -> String {
    let items: Vec<Value> = result["content"]
        .as_array()
        .map(|content| {
            content
                .iter()
                .filter_map(|item| item["text"].as_str())
                .map(|text| {
                    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    if items.is_empty() {
        return "[]".to_string();
    }
    Value::Array(items).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_tool_output_parses_json_text() {
        let result = json!({
            "content": [{"type": "text", "text": "[{\"id\":\"1\"}]"}],
            "isError": false
        });
        assert_eq!(collect_tool_output(&result), r#"[[{"id":"1"}]]"#);
    }

    #[test]
    fn test_collect_tool_output_keeps_plain_text() {
        let result = json!({
            "content": [{"type": "text", "text": "Invalid input: bad"}],
            "isError": true
        });
        assert_eq!(collect_tool_output(&result), r#"["Invalid input: bad"]"#);
    }

    #[test]
    fn test_collect_tool_output_empty() {
        assert_eq!(collect_tool_output(&json!({})), "[]");
        assert_eq!(collect_tool_output(&json!({"content": []})), "[]");
    }

    #[test]
    fn test_endpoint_normalised() {
        let client = McpClient::new("http://localhost:8000/");
        assert_eq!(client.endpoint, "http://localhost:8000/mcp");
    }

    #[test]
    fn test_tool_deserialization() {
        let tool: McpTool = serde_json::from_value(json!({
            "name": "get_deployments",
            "description": "Retrieves deployment tasks",
            "inputSchema": {"type": "object"}
        }))
        .unwrap();
        assert_eq!(tool.name, "get_deployments");
        assert_eq!(tool.input_schema["type"], "object");
    }
}
