// MCP (Model Context Protocol) Server for argo-watcher
//
// A small hand-rolled JSON-RPC implementation exposing the get_deployments
// tool over stdio or HTTP.

pub mod protocol;
pub mod server;

pub use protocol::*;
pub use server::MCPServer;
