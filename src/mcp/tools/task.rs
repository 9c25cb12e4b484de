//! Task tools: next-task context and status changes

use super::{
    feature_name_schema, get_optional_string, get_required_string, to_json, ToolDefinition,
};
use crate::models::TaskStatus;
use crate::services::{mark_task_status, next_or_named_task, MarkTaskInput, Workspace};
use crate::Result;
use serde_json::{json, Value};

pub fn next_definition() -> ToolDefinition {
    ToolDefinition {
        name: "next_or_named_task".to_string(),
        description: "Get a task to work on with the requirements, design and tasks documents as context. Without task_identifier the next incomplete task is selected; sub-tasks come before their parent.".to_string(),
        input_schema: json!({
            "type": "object",
            "required": ["feature_name"],
            "properties": {
                "feature_name": feature_name_schema(),
                "task_identifier": {
                    "type": "string",
                    "description": "Task id such as '2' or '2.1'"
                }
            }
        }),
    }
}

pub fn execute_next(args: &Value, workspace: &Workspace) -> Result<String> {
    let feature = get_required_string(args, "feature_name")?;
    let task_id = get_optional_string(args, "task_identifier");
    let context = next_or_named_task(workspace, &feature, task_id.as_deref())?;
    to_json(&context)
}

pub fn mark_definition() -> ToolDefinition {
    ToolDefinition {
        name: "mark_task_status".to_string(),
        description: "Set a task's status. A task can only be completed when all of its sub-tasks are completed; references to missing requirement clauses are reported as warnings.".to_string(),
        input_schema: json!({
            "type": "object",
            "required": ["feature_name", "task_identifier", "status"],
            "properties": {
                "feature_name": feature_name_schema(),
                "task_identifier": {
                    "type": "string",
                    "description": "Task id such as '2' or '2.1'"
                },
                "status": {
                    "type": "string",
                    "enum": ["not-started", "in-progress", "completed"]
                }
            }
        }),
    }
}

pub fn execute_mark(args: &Value, workspace: &Workspace) -> Result<String> {
    let status: TaskStatus = get_required_string(args, "status")?
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let outcome = mark_task_status(
        workspace,
        MarkTaskInput {
            feature_name: get_required_string(args, "feature_name")?,
            task_id: get_required_string(args, "task_identifier")?,
            status,
        },
    )?;
    to_json(&outcome)
}
