// HTTP Interface for argo-watcher MCP
//
// Liveness/readiness probes plus the MCP JSON-RPC endpoint, all sharing one
// downstream client.

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::client::DeploymentSource;
use crate::error::ArgoError;
use crate::mcp::MCPServer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn DeploymentSource>,
    pub mcp: MCPServer,
}

impl AppState {
    pub fn new(source: Arc<dyn DeploymentSource>) -> Self {
        let mcp = MCPServer::new(Arc::clone(&source));
        Self { source, mcp }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Build the router with all operator and MCP routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/live", get(liveness_check))
        .route("/health/live", get(liveness_check))
        .route("/ready", get(readiness_check))
        .route("/readyz", get(readiness_check))
        .route("/health/ready", get(readiness_check))
        .route("/mcp", post(mcp_endpoint))
        .with_state(state)
}

/// Serve the router on `bind_addr` until `shutdown` resolves.
pub async fn run_http_interface<F>(bind_addr: &str, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("✅ HTTP interface ready - listening on http://{}", bind_addr);
    info!("   MCP endpoint: POST /mcp");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}

async fn healthz() -> Json<HealthStatus> {
    Json(HealthStatus { status: "up" })
}

async fn liveness_check() -> Json<HealthStatus> {
    Json(HealthStatus { status: "alive" })
}

/// Ready only when argo-watcher answers its own health check.
async fn readiness_check(State(state): State<AppState>) -> Response {
    match state.source.check_health().await {
        Ok(()) => Json(HealthStatus { status: "ready" }).into_response(),
        Err(e) => {
            let detail = match &e {
                ArgoError::Transport(_) => format!(
                    "Downstream service argo-watcher is unreachable. Reason: {}",
                    e
                ),
                _ => format!(
                    "Downstream service argo-watcher is unhealthy. Reason: {}",
                    e
                ),
            };
            warn!("Readiness check failed: {}", detail);
            (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorDetail { detail })).into_response()
        }
    }
}

/// One JSON-RPC message per request. Notifications are acknowledged with 202.
async fn mcp_endpoint(State(state): State<AppState>, body: String) -> Response {
    match state.mcp.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
