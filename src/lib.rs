// specd - phase-gated feature specifications
// Requirements, design and tasks documents with approval gates, served over a CLI and MCP

pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod models;
pub mod parser;
pub mod resolver;
pub mod services;
pub mod storage;
pub mod tasks;
pub mod workflow;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use config::SpecdConfig;
pub use error::{SpecError, SpecResult};
pub use models::{DocumentType, Phase, Specification, Task, TaskList, TaskStatus};
pub use services::Workspace;
pub use workflow::WorkflowEngine;
