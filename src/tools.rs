// get_deployments tool
//
// Decodes tool arguments, resolves the time window and makes the single
// downstream call.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::info;

use crate::client::{DeploymentSource, Task};
use crate::error::{ArgoError, Result};
use crate::resolver::DeploymentQuery;

pub const GET_DEPLOYMENTS: &str = "get_deployments";

const GET_DEPLOYMENTS_DESCRIPTION: &str = "Retrieves deployment tasks from argo-watcher. \
Filter by application name and a time range. The time range can be given as a relative \
'time_delta' (e.g. '30m', '2h', '7d'), as absolute ISO 8601 'from_datetime'/'to_datetime' \
values (UTC is assumed when no offset is given), or as raw Unix timestamps. \
Absolute datetimes take precedence over 'time_delta'. Without any time range the last day is searched.";

/// MCP tool definitions served by `tools/list`.
pub fn list_tools() -> Vec<Value> {
    vec![json!({
        "name": GET_DEPLOYMENTS,
        "description": GET_DEPLOYMENTS_DESCRIPTION,
        "inputSchema": {
            "type": "object",
            "properties": {
                "app": {
                    "type": "string",
                    "description": "The name of the application to filter by."
                },
                "time_delta": {
                    "type": "string",
                    "pattern": "^\\d+[mhdMHD]$",
                    "description": "Relative look-back window: a number followed by 'm' (minutes), 'h' (hours) or 'd' (days), e.g. '2h'."
                },
                "from_datetime": {
                    "type": "string",
                    "description": "Start of the range as an ISO 8601 datetime, e.g. '2023-10-27T08:00:00Z'. Overrides 'time_delta'."
                },
                "to_datetime": {
                    "type": "string",
                    "description": "End of the range as an ISO 8601 datetime. Defaults to now. Only used with 'from_datetime'."
                },
                "days_history": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "How many days of history to search when using raw timestamps. Defaults to 30."
                },
                "from_timestamp": {
                    "type": "integer",
                    "description": "Start of the range as a Unix timestamp. Overrides 'days_history'."
                },
                "to_timestamp": {
                    "type": "integer",
                    "description": "End of the range as a Unix timestamp. Defaults to now."
                }
            },
            "required": []
        }
    })]
}

/// Decode `tools/call` arguments. Missing or null arguments mean "all defaults".
pub fn parse_arguments(arguments: &Value) -> Result<DeploymentQuery> {
    match arguments {
        Value::Null => Ok(DeploymentQuery::default()),
        Value::Object(_) => serde_json::from_value(arguments.clone())
            .map_err(|e| ArgoError::InvalidInput(format!("Invalid arguments: {}", e))),
        _ => Err(ArgoError::InvalidInput(
            "Tool arguments must be a JSON object".to_string(),
        )),
    }
}

/// Resolve the window against `now` and fetch matching tasks.
pub async fn get_deployments(
    source: &dyn DeploymentSource,
    query: &DeploymentQuery,
    now: DateTime<Utc>,
) -> Result<Vec<Task>> {
    let window = query.resolve(now)?;
    info!(
        "🔧 get_deployments from={} to={} app={:?}",
        window.from_timestamp, window.to_timestamp, window.app
    );

    source
        .get_tasks(
            window.from_timestamp,
            Some(window.to_timestamp),
            window.app.as_deref(),
        )
        .await
}
