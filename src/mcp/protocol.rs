// MCP Protocol Implementation
//
// JSON-RPC handlers for the Model Context Protocol methods this server
// supports. Transport-agnostic: they take a parsed request and return the
// response object.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::client::DeploymentSource;
use crate::tools::{self, GET_DEPLOYMENTS};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "ArgoWatcherMCP";
pub const SERVER_INSTRUCTIONS: &str = "This server provides tools to query an argo-watcher instance.";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// Build a JSON-RPC error response.
pub fn error_response(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

fn result_response(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

/// Handle MCP initialization request
pub fn handle_initialize(request: &Value) -> Value {
    result_response(
        &request["id"],
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": SERVER_INSTRUCTIONS
        }),
    )
}

pub fn handle_ping(request: &Value) -> Value {
    result_response(&request["id"], json!({}))
}

/// Handle MCP tools/list request
pub fn handle_tools_list(request: &Value) -> Value {
    result_response(&request["id"], json!({ "tools": tools::list_tools() }))
}

/// Handle MCP tools/call request
pub async fn handle_tools_call(source: &dyn DeploymentSource, request: &Value) -> Value {
    let id = &request["id"];
    let params = &request["params"];
    let tool_name = params["name"].as_str().unwrap_or("");

    info!("🔧 MCP tool call: {}", tool_name);

    if tool_name != GET_DEPLOYMENTS {
        error!("Unknown tool: {}", tool_name);
        return error_response(id, INVALID_PARAMS, &format!("Unknown tool: {}", tool_name));
    }

    let outcome = match tools::parse_arguments(&params["arguments"]) {
        Ok(query) => tools::get_deployments(source, &query, Utc::now()).await,
        Err(e) => Err(e),
    };

    let result = match outcome {
        Ok(tasks) => match serde_json::to_string(&tasks) {
            Ok(text) => {
                info!("✅ get_deployments returned {} task(s)", tasks.len());
                tool_result(text, false)
            }
            Err(e) => tool_result(format!("Failed to encode tasks: {}", e), true),
        },
        Err(e) => {
            error!("get_deployments failed ({}): {}", e.error_type(), e);
            tool_result(e.to_string(), true)
        }
    };

    result_response(id, result)
}

fn tool_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ],
        "isError": is_error
    })
}
