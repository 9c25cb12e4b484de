//! Error taxonomy of specification operations
//!
//! Each variant carries the offending identifier and maps to a stable code
//! and a remediation hint surfaced by the CLI and MCP layers.

use crate::models::{DocumentType, Phase};
use thiserror::Error;

pub type SpecResult<T> = std::result::Result<T, SpecError>;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Specification '{0}' not found")]
    SpecNotFound(String),

    #[error("Specification '{0}' already exists")]
    SpecAlreadyExists(String),

    #[error("Invalid feature name '{name}': {reason}")]
    InvalidFeatureName { name: String, reason: String },

    #[error("Cannot advance '{feature}' from {from}: {reason}")]
    InvalidPhaseTransition {
        feature: String,
        from: Phase,
        reason: String,
    },

    #[error("Cannot write {document} for '{feature}': the {prerequisite} document is missing or not approved")]
    MissingPrerequisiteDocument {
        feature: String,
        document: DocumentType,
        prerequisite: DocumentType,
    },

    #[error("No {document} document exists for '{feature}'")]
    DocumentNotFound {
        feature: String,
        document: DocumentType,
    },

    #[error("Task '{task}' not found in '{feature}'")]
    TaskNotFound { feature: String, task: String },

    #[error("Task '{task}' cannot be completed while sub-tasks {} are incomplete", .incomplete.join(", "))]
    TaskHierarchyViolation {
        task: String,
        incomplete: Vec<String>,
    },

    #[error("Task '{task}' references requirement clause {reference}, which does not exist")]
    DanglingRequirementReference { task: String, reference: String },

    #[error("Referenced file not found: {path}")]
    FileReferenceNotFound { path: String },

    #[error("Invalid file reference '{path}': {reason}")]
    FileReferenceInvalid { path: String, reason: String },

    #[error("File reference cycle: {}", .chain.join(" -> "))]
    FileReferenceCycle { chain: Vec<String> },

    #[error("Validation error{}: {message}", .line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Validation {
        message: String,
        line: Option<usize>,
    },

    #[error("{document} document is {size} bytes, larger than the {limit} byte limit")]
    DocumentTooLarge {
        document: DocumentType,
        size: usize,
        limit: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_yaml::Error),
}

impl SpecError {
    pub fn validation(message: impl Into<String>, line: Option<usize>) -> Self {
        SpecError::Validation {
            message: message.into(),
            line,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            SpecError::SpecNotFound(_) => "SPEC_NOT_FOUND",
            SpecError::SpecAlreadyExists(_) => "SPEC_ALREADY_EXISTS",
            SpecError::InvalidFeatureName { .. } => "INVALID_SPEC_NAME",
            SpecError::InvalidPhaseTransition { .. } => "INVALID_PHASE_TRANSITION",
            SpecError::MissingPrerequisiteDocument { .. } => "MISSING_PREREQUISITE_DOCUMENT",
            SpecError::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            SpecError::TaskNotFound { .. } => "TASK_NOT_FOUND",
            SpecError::TaskHierarchyViolation { .. } => "TASK_HIERARCHY_VIOLATION",
            SpecError::DanglingRequirementReference { .. } => "DANGLING_REQUIREMENT_REFERENCE",
            SpecError::FileReferenceNotFound { .. } => "FILE_REFERENCE_NOT_FOUND",
            SpecError::FileReferenceInvalid { .. } => "FILE_REFERENCE_INVALID",
            SpecError::FileReferenceCycle { .. } => "FILE_REFERENCE_CYCLE",
            SpecError::Validation { .. } => "VALIDATION_ERROR",
            SpecError::DocumentTooLarge { .. } => "DOCUMENT_TOO_LARGE",
            SpecError::Io(_) => "IO_ERROR",
            SpecError::Metadata(_) => "METADATA_ERROR",
        }
    }

    /// Suggested next step for the caller
    pub fn hint(&self) -> Option<String> {
        let hint = match self {
            SpecError::SpecNotFound(_) => {
                "check the feature name with list_specifications".to_string()
            }
            SpecError::SpecAlreadyExists(name) => format!(
                "choose a different feature name or delete '{}' first",
                name
            ),
            SpecError::InvalidFeatureName { .. } => {
                "use kebab-case, e.g. 'user-authentication'".to_string()
            }
            SpecError::InvalidPhaseTransition { from, .. } => match from.document() {
                Some(doc) => format!(
                    "make the {} document non-empty and structurally valid, then approve it",
                    doc
                ),
                None => "the workflow is already complete".to_string(),
            },
            SpecError::MissingPrerequisiteDocument {
                document,
                prerequisite,
                ..
            } => format!(
                "approve the {} document before editing {}",
                prerequisite, document
            ),
            SpecError::DocumentNotFound { document, .. } => {
                format!("create the {} document with update_document", document)
            }
            SpecError::TaskNotFound { .. } => {
                "use next_or_named_task without an identifier to list the next task".to_string()
            }
            SpecError::TaskHierarchyViolation { incomplete, .. } => {
                format!("complete sub-tasks {} first", incomplete.join(", "))
            }
            SpecError::DanglingRequirementReference { .. } => {
                "update the task's _Requirements:_ line or add the clause to requirements"
                    .to_string()
            }
            SpecError::FileReferenceNotFound { .. } => {
                "paths are resolved relative to the specification directory".to_string()
            }
            SpecError::FileReferenceInvalid { .. } => {
                "reference a file inside the specification directory".to_string()
            }
            SpecError::FileReferenceCycle { .. } => {
                "remove one of the #[[file:...]] markers in the chain".to_string()
            }
            SpecError::Validation { .. } => {
                "tasks use '- [ ] N. description' with at most one level of indented sub-tasks"
                    .to_string()
            }
            SpecError::DocumentTooLarge { .. } => {
                "split the document or raise max_document_size in specd.toml".to_string()
            }
            SpecError::Io(_) | SpecError::Metadata(_) => return None,
        };
        Some(hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prerequisite_hint() {
        let err = SpecError::MissingPrerequisiteDocument {
            feature: "user-auth".to_string(),
            document: DocumentType::Design,
            prerequisite: DocumentType::Requirements,
        };
        assert_eq!(err.code(), "MISSING_PREREQUISITE_DOCUMENT");
        assert_eq!(
            err.hint().as_deref(),
            Some("approve the requirements document before editing design")
        );
        assert!(err.to_string().contains("user-auth"));
    }

    #[test]
    fn test_hierarchy_message_lists_sub_tasks() {
        let err = SpecError::TaskHierarchyViolation {
            task: "1".to_string(),
            incomplete: vec!["1.1".to_string(), "1.3".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Task '1' cannot be completed while sub-tasks 1.1, 1.3 are incomplete"
        );
    }

    #[test]
    fn test_validation_message_line() {
        let err = SpecError::validation("nesting too deep", Some(4));
        assert_eq!(err.to_string(), "Validation error at line 4: nesting too deep");
        let err = SpecError::validation("empty", None);
        assert_eq!(err.to_string(), "Validation error: empty");
    }

    #[test]
    fn test_cycle_message() {
        let err = SpecError::FileReferenceCycle {
            chain: vec!["a.md".to_string(), "b.md".to_string(), "a.md".to_string()],
        };
        assert_eq!(err.to_string(), "File reference cycle: a.md -> b.md -> a.md");
    }
}
