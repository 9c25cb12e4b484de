//! MCP (Model Context Protocol) server for specd
//!
//! Exposes the specification operations as tools over JSON-RPC 2.0 on stdio.
//!
//! ## Tools
//! - `create_specification` - Create a specification with initial requirements
//! - `update_document` - Replace a document, optionally approving it
//! - `list_specifications` - Phase, documents and task progress per specification
//! - `read_document` - Read a document with file references resolved
//! - `next_or_named_task` - Next task (or a named one) with full context
//! - `mark_task_status` - Change a task's status under the completion rules
//! - `delete_specification` - Remove a specification bundle

pub mod server;
pub mod tools;

pub use server::McpServer;
