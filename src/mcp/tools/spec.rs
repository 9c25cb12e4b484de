//! Specification lifecycle tools: create, list and delete

use super::{feature_name_schema, get_required_string, to_json, ToolDefinition};
use crate::services::{
    create_specification, delete_specification, list_specifications, CreateSpecInput, Workspace,
};
use crate::Result;
use serde_json::{json, Value};

pub fn create_definition() -> ToolDefinition {
    ToolDefinition {
        name: "create_specification".to_string(),
        description: "Create a new feature specification in the REQUIREMENTS phase with an initial requirements document generated from the idea".to_string(),
        input_schema: json!({
            "type": "object",
            "required": ["feature_name", "initial_idea"],
            "properties": {
                "feature_name": feature_name_schema(),
                "initial_idea": {
                    "type": "string",
                    "description": "Short description of the feature"
                }
            }
        }),
    }
}

pub fn execute_create(args: &Value, workspace: &Workspace) -> Result<String> {
    let outcome = create_specification(
        workspace,
        CreateSpecInput {
            feature_name: get_required_string(args, "feature_name")?,
            initial_idea: get_required_string(args, "initial_idea")?,
        },
    )?;
    to_json(&outcome)
}

pub fn list_definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_specifications".to_string(),
        description: "List all specifications with their phase, existing documents and task completion".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub fn execute_list(_args: &Value, workspace: &Workspace) -> Result<String> {
    let specs = list_specifications(workspace)?;
    to_json(&json!({
        "total": specs.len(),
        "specifications": specs,
    }))
}

pub fn delete_definition() -> ToolDefinition {
    ToolDefinition {
        name: "delete_specification".to_string(),
        description: "Delete a specification and all of its documents".to_string(),
        input_schema: json!({
            "type": "object",
            "required": ["feature_name"],
            "properties": {
                "feature_name": feature_name_schema()
            }
        }),
    }
}

pub fn execute_delete(args: &Value, workspace: &Workspace) -> Result<String> {
    let feature = get_required_string(args, "feature_name")?;
    to_json(&delete_specification(workspace, &feature)?)
}
