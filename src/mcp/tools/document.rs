//! Document tools: update and read

use super::{
    document_type_schema, feature_name_schema, get_document_type, get_flag, get_required_string,
    to_json, ToolDefinition,
};
use crate::models::DocumentType;
use crate::services::{
    read_document, update_document, ReadDocumentInput, UpdateDocumentInput, Workspace,
};
use crate::Result;
use serde_json::{json, Value};

pub fn update_definition() -> ToolDefinition {
    ToolDefinition {
        name: "update_document".to_string(),
        description: "Replace a document of a specification. Set approval_granted only after the user explicitly approved the content; approving the current phase's document advances the workflow. Tasks documents are reformatted into canonical form.".to_string(),
        input_schema: json!({
            "type": "object",
            "required": ["feature_name", "document_type", "content"],
            "properties": {
                "feature_name": feature_name_schema(),
                "document_type": document_type_schema(),
                "content": {
                    "type": "string",
                    "description": "Full new content of the document"
                },
                "approval_granted": {
                    "type": "boolean",
                    "description": "The user explicitly approved this content",
                    "default": false
                }
            }
        }),
    }
}

pub fn execute_update(args: &Value, workspace: &Workspace) -> Result<String> {
    let input = UpdateDocumentInput {
        feature_name: get_required_string(args, "feature_name")?,
        document: get_document_type(args)?,
        content: get_required_string(args, "content")?,
        approval_granted: get_flag(args, "approval_granted")?,
    };
    let document = input.document;
    let outcome = update_document(workspace, input)?;

    let mut value = serde_json::to_value(&outcome)?;
    if document == DocumentType::Tasks {
        value["content"] = Value::String(outcome.content.clone());
    }
    to_json(&value)
}

pub fn read_definition() -> ToolDefinition {
    ToolDefinition {
        name: "read_document".to_string(),
        description: "Read a document of a specification with #[[file:...]] references resolved".to_string(),
        input_schema: json!({
            "type": "object",
            "required": ["feature_name", "document_type"],
            "properties": {
                "feature_name": feature_name_schema(),
                "document_type": document_type_schema(),
                "raw": {
                    "type": "boolean",
                    "description": "Return stored text without resolving file references",
                    "default": false
                }
            }
        }),
    }
}

pub fn execute_read(args: &Value, workspace: &Workspace) -> Result<String> {
    let view = read_document(
        workspace,
        ReadDocumentInput {
            feature_name: get_required_string(args, "feature_name")?,
            document: get_document_type(args)?,
            raw: get_flag(args, "raw")?,
        },
    )?;
    to_json(&view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpecdConfig;
    use crate::mcp::tools::spec::execute_create;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, Workspace) {
        let temp_dir = TempDir::new().unwrap();
        let workspace = Workspace::with_config(temp_dir.path(), SpecdConfig::default());
        execute_create(
            &json!({"feature_name": "user-auth", "initial_idea": "login system"}),
            &workspace,
        )
        .unwrap();
        (temp_dir, workspace)
    }

    #[test]
    fn test_update_with_approval_advances() {
        let (_tmp, workspace) = workspace();
        let result = execute_update(
            &json!({
                "feature_name": "user-auth",
                "document_type": "requirements",
                "content": "### Requirement 1\n\n1. WHEN a user signs in THEN the system SHALL start a session\n",
                "approval_granted": true
            }),
            &workspace,
        )
        .unwrap();
        let outcome: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(outcome["previous_phase"], "REQUIREMENTS");
        assert_eq!(outcome["phase"], "DESIGN");
        assert_eq!(outcome["advanced"], true);
        assert!(outcome.get("content").is_none());
    }

    #[test]
    fn test_read_document() {
        let (_tmp, workspace) = workspace();
        let result = execute_read(
            &json!({"feature_name": "user-auth", "document_type": "requirements"}),
            &workspace,
        )
        .unwrap();
        let view: Value = serde_json::from_str(&result).unwrap();
        assert!(view["content"]
            .as_str()
            .unwrap()
            .contains("#### Acceptance Criteria"));
        assert_eq!(view["phase"], "REQUIREMENTS");
    }
}
