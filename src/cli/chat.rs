// Interactive chat session: conversation history, LLM turns and tool calls

use anyhow::{anyhow, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::api::{McpClient, McpTool};
use crate::llm::{ChatMessage, LlmClient, LlmError};

const SEPARATOR_WIDTH: usize = 50;

/// Convert MCP tool definitions into OpenAI function-tool definitions.
pub fn to_openai_tools(tools: &[McpTool]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.input_schema,
                }
            })
        })
        .collect()
}

pub fn is_exit_command(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "exit" | "quit")
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub struct ChatManager {
    mcp: McpClient,
    llm: LlmClient,
    messages: Vec<ChatMessage>,
    tools: Vec<Value>,
}

impl ChatManager {
    pub fn new(mcp: McpClient, llm: LlmClient) -> Self {
        Self {
            mcp,
            llm,
            messages: Vec::new(),
            tools: Vec::new(),
        }
    }

    /// Discover tools before starting the chat.
    pub async fn initialize(&mut self) -> Result<()> {
        println!("Discovering tools from MCP server...");
        self.mcp
            .initialize()
            .await
            .map_err(|e| anyhow!("Error discovering tools: {}", e))?;
        let tools = self
            .mcp
            .list_tools()
            .await
            .map_err(|e| anyhow!("Error discovering tools: {}", e))?;

        if tools.is_empty() {
            return Err(anyhow!("No tools found on the server. Cannot start chat."));
        }

        self.tools = to_openai_tools(&tools);
        println!("{}", "✔ Tools discovered successfully.".green().bold());
        Ok(())
    }

    /// Run each requested tool, then ask the model to summarise the results.
    async fn handle_tool_calls(&mut self, response_message: &ChatMessage) -> Result<Option<String>> {
        debug!("🧠 LLM decided to call a tool...");

        for tool_call in response_message.tool_calls.iter().flatten() {
            let function_name = &tool_call.function.name;
            let function_args: Value = if tool_call.function.arguments.trim().is_empty() {
                json!({})
            } else {
                serde_json::from_str(&tool_call.function.arguments).map_err(|e| {
                    anyhow!("LLM sent invalid arguments for '{}': {}", function_name, e)
                })?
            };
            debug!("LLM wants to call: {} {}", function_name, function_args);

            let output = self.mcp.call_tool(function_name, function_args).await?;
            self.messages
                .push(ChatMessage::tool(&tool_call.id, function_name, output));
        }

        let progress = spinner("Summarizing tool results...");
        let second = self.llm.complete(&self.messages, None).await;
        progress.finish_and_clear();

        let second = second?;
        let final_answer = second.content.clone();
        self.messages.push(second);
        Ok(final_answer)
    }

    /// One user turn. Any failure restores the history to its state before
    /// the prompt, so no unanswered tool calls are left behind.
    async fn turn(&mut self, prompt: &str) -> Result<Option<String>> {
        let history_len = self.messages.len();
        let result = self.exchange(prompt).await;
        if result.is_err() {
            self.messages.truncate(history_len);
        }
        result
    }

    async fn exchange(&mut self, prompt: &str) -> Result<Option<String>> {
        self.messages.push(ChatMessage::user(prompt));

        let progress = spinner("Thinking...");
        let response = self.llm.complete(&self.messages, Some(self.tools.as_slice())).await;
        progress.finish_and_clear();

        let response_message = response?;
        self.messages.push(response_message.clone());

        if response_message.has_tool_calls() {
            self.handle_tool_calls(&response_message).await
        } else {
            Ok(response_message.content)
        }
    }

    /// The main interactive chat loop.
    pub async fn start_chat(&mut self) -> Result<()> {
        self.initialize().await?;

        println!();
        println!("{}", "Welcome to the Argo Watcher AI Assistant!".bold());
        println!("Type your questions below, or type 'exit' or 'quit' to end the session.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("{} ", "You:".yellow().bold());
            std::io::stdout().flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => None,
            };

            let Some(prompt) = line else {
                println!();
                println!("{}", "Goodbye!".bold());
                break;
            };

            if is_exit_command(&prompt) {
                println!("{}", "Goodbye!".bold());
                break;
            }
            if prompt.trim().is_empty() {
                continue;
            }

            match self.turn(&prompt).await {
                Ok(answer) => {
                    println!();
                    println!("{}", "Assistant:".green().bold());
                    println!(
                        "{}",
                        answer.unwrap_or_else(|| "Sorry, I couldn't generate a response.".to_string())
                    );
                    println!("{}", "-".repeat(SEPARATOR_WIDTH));
                }
                Err(e) if e.downcast_ref::<LlmError>().is_some() => {
                    println!();
                    println!("{}", format!("An LLM API error occurred: {}", e).red().bold());
                }
                Err(e) => {
                    println!();
                    println!(
                        "{}",
                        format!("An unexpected error occurred during the chat: {}", e)
                            .red()
                            .bold()
                    );
                }
            }
        }

        Ok(())
    }
}
