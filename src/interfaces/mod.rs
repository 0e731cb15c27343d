// argo-watcher MCP Service Interfaces
//
// HTTP (health probes + MCP endpoint) or MCP over stdio, both backed by one
// explicitly constructed downstream client.

pub mod http;
pub mod mcp;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::client::{ArgoWatcherClient, DeploymentSource};
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Stdio,
}

/// Build the shared client from `config` and serve the chosen transport.
/// The client is dropped, closing its pool, when this returns.
pub async fn run(config: Config, transport: Transport) -> Result<()> {
    let client = ArgoWatcherClient::from_config(&config)?;
    info!("🌐 argo-watcher base URL: {}", client.base_url());

    let source: Arc<dyn DeploymentSource> = Arc::new(client);

    match transport {
        Transport::Http => {
            let state = http::AppState::new(source);
            http::run_http_interface(&config.bind_addr, state, http::shutdown_signal()).await?;
        }
        Transport::Stdio => mcp::run_mcp_interface(source).await?,
    }

    info!("Application shutdown complete. HTTP client closed.");
    Ok(())
}
