// MCP stdio Interface
//
// Serves MCP over stdin/stdout for clients that spawn the server as a
// subprocess. Logs must go to stderr in this mode.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use crate::client::DeploymentSource;
use crate::mcp::MCPServer;

/// Run the MCP interface on stdio until stdin closes.
pub async fn run_mcp_interface(source: Arc<dyn DeploymentSource>) -> Result<()> {
    info!("🤖 Starting MCP interface (stdio)...");

    let mcp_server = MCPServer::new(source);

    if let Err(e) = mcp_server.run_stdio().await {
        error!("❌ MCP interface error: {}", e);
        return Err(e);
    }

    Ok(())
}
