//! MCP Tool Registry and Implementations
//!
//! Each tool validates its JSON arguments, calls the matching service and
//! returns the outcome as pretty-printed JSON.

pub mod document;
pub mod spec;
pub mod task;

use crate::error::SpecError;
use crate::models::DocumentType;
use crate::services::Workspace;
use crate::Result;
use serde::Serialize;
use serde_json::{json, Value};

/// Registry of available MCP tools
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

/// Tool definition for MCP protocol
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolRegistry {
    /// Create a new tool registry with all available tools
    pub fn new() -> Self {
        Self {
            tools: vec![
                spec::create_definition(),
                document::update_definition(),
                spec::list_definition(),
                document::read_definition(),
                task::next_definition(),
                task::mark_definition(),
                spec::delete_definition(),
            ],
        }
    }

    /// List all available tools in MCP format
    pub fn list_tools(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name with the given arguments
    pub fn call_tool(&self, name: &str, arguments: &Value, workspace: &Workspace) -> Result<String> {
        match name {
            "create_specification" => spec::execute_create(arguments, workspace),
            "update_document" => document::execute_update(arguments, workspace),
            "list_specifications" => spec::execute_list(arguments, workspace),
            "read_document" => document::execute_read(arguments, workspace),
            "next_or_named_task" => task::execute_next(arguments, workspace),
            "mark_task_status" => task::execute_mark(arguments, workspace),
            "delete_specification" => spec::execute_delete(arguments, workspace),
            _ => anyhow::bail!("Unknown tool: {}", name),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Text of a failed tool call: code, message and hint for specification
/// errors, the plain message otherwise
pub fn error_text(err: &anyhow::Error) -> String {
    match err.downcast_ref::<SpecError>() {
        Some(spec_err) => {
            let payload = json!({
                "code": spec_err.code(),
                "message": spec_err.to_string(),
                "hint": spec_err.hint(),
            });
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| format!("Error: {}", err))
        }
        None => format!("Error: {:#}", err),
    }
}

/// Serialize a tool outcome
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Helper to extract a required string field from JSON
pub fn get_required_string(args: &Value, field: &str) -> Result<String> {
    args.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Missing required field: {}", field))
}

/// Helper to extract an optional string field from JSON
pub fn get_optional_string(args: &Value, field: &str) -> Option<String> {
    args.get(field).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Helper to extract an optional boolean flag, false when absent
pub fn get_flag(args: &Value, field: &str) -> Result<bool> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => anyhow::bail!("Field {} must be a boolean, got {}", field, other),
    }
}

/// Helper to extract the `document_type` field
pub fn get_document_type(args: &Value) -> Result<DocumentType> {
    let value = get_required_string(args, "document_type")?;
    value.parse().map_err(|e: String| anyhow::anyhow!(e))
}

pub fn feature_name_schema() -> Value {
    json!({
        "type": "string",
        "description": "Kebab-case feature name, e.g. 'user-authentication'"
    })
}

pub fn document_type_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["requirements", "design", "tasks"],
        "description": "Which document of the specification"
    })
}
