//! `specd serve` - MCP server on stdio

use crate::mcp::McpServer;
use crate::services::Workspace;
use crate::Result;

pub async fn run(workspace: Workspace) -> Result<()> {
    let server = McpServer::new(workspace);
    server.run().await
}
