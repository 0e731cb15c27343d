// argo-watcher MCP Library
//
// Deployment query resolution, the argo-watcher API client and the MCP tool
// server built on them.

pub mod client;
pub mod config;
pub mod error;
pub mod mcp;
pub mod resolver;
pub mod tools;

#[cfg(feature = "service")]
pub mod interfaces;

pub use client::{ArgoWatcherClient, DeploymentSource, Image, Task};
pub use config::Config;
pub use error::ArgoError;
pub use resolver::{DeploymentQuery, QueryWindow, TimeSpec, TimeUnit};
