use anyhow::Result;
use argo_watcher_mcp::config::Config;
use argo_watcher_mcp::interfaces::{self, Transport};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// argo-watcher MCP server - query deployments from an LLM
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serve MCP over stdin/stdout instead of HTTP
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for the stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let transport = if args.stdio {
        Transport::Stdio
    } else {
        Transport::Http
    };

    info!(
        "🚀 Starting argo-watcher MCP server v{} ({:?})",
        env!("CARGO_PKG_VERSION"),
        transport
    );

    interfaces::run(config, transport).await
}
