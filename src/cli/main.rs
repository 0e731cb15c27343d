// argo-watcher chat - talk to the argo-watcher MCP server through an LLM

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod api;
mod chat;
mod llm;

use api::McpClient;
use chat::ChatManager;
use llm::{LlmClient, DEFAULT_MODEL, DEFAULT_OPENAI_BASE_URL};

/// An interactive CLI to chat with the Argo Watcher MCP server via an LLM.
#[derive(Parser)]
#[command(name = "argo-watcher-chat")]
#[command(version)]
#[command(about = "Chat with the Argo Watcher MCP server via an LLM", long_about = None)]
struct Cli {
    /// Enable debug output for tool calls
    #[arg(long)]
    debug: bool,

    /// Base URL of the MCP server
    #[arg(long, env = "MCP_SERVER_URL", default_value = "http://localhost:8000")]
    server: String,

    /// Chat model to use
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    openai_base_url: String,

    /// API key for the LLM provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "argo_watcher_chat=debug,warn" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(api_key) = cli.api_key.filter(|k| !k.trim().is_empty()) else {
        eprintln!(
            "{} The OPENAI_API_KEY environment variable is not set.",
            "Error:".red().bold()
        );
        std::process::exit(1);
    };

    let mcp = McpClient::new(&cli.server);
    let llm = LlmClient::new(&cli.openai_base_url, api_key, cli.model);
    let mut chat = ChatManager::new(mcp, llm);

    if let Err(e) = chat.start_chat().await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
