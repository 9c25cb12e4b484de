//! Tasks service - next-task selection and status tracking

use super::Workspace;
use crate::error::SpecError;
use crate::models::{DocumentType, Finding, Progress, Task, TaskStatus};
use crate::parser::requirements::RequirementCatalog;
use crate::storage::SpecRepository;
use crate::tasks::next_task;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Input structure for changing a task's status
#[derive(Debug, Clone)]
pub struct MarkTaskInput {
    pub feature_name: String,
    pub task_id: String,
    pub status: TaskStatus,
}

/// A referenced acceptance criterion
#[derive(Debug, Clone, Serialize)]
pub struct ClauseView {
    pub reference: String,
    pub text: String,
}

/// A task with everything needed to work on it
#[derive(Debug, Clone, Serialize)]
pub struct TaskContext {
    pub feature_name: String,
    /// `None` when every task is completed
    pub task: Option<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<ClauseView>,
    pub progress: Progress,
    /// Document contents with file references substituted
    pub documents: BTreeMap<DocumentType, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkOutcome {
    pub feature_name: String,
    pub task_id: String,
    pub previous: TaskStatus,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reopened: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Finding>,
    pub progress: Progress,
}

/// The named task, or the next one to work on, with its full context
pub fn next_or_named_task(
    workspace: &Workspace,
    feature: &str,
    task_id: Option<&str>,
) -> Result<TaskContext> {
    let repo = workspace.repo();
    let tasks = repo
        .read_document(feature, DocumentType::Tasks)?
        .ok_or_else(|| SpecError::DocumentNotFound {
            feature: feature.to_string(),
            document: DocumentType::Tasks,
        })?;
    let list = workspace.processor().parse(&tasks)?.list;

    let selected = match task_id {
        Some(id) => Some(list.find(id).ok_or_else(|| SpecError::TaskNotFound {
            feature: feature.to_string(),
            task: id.to_string(),
        })?),
        None => next_task(&list),
    };

    let requirements = repo
        .read_document(feature, DocumentType::Requirements)?
        .unwrap_or_default();
    let catalog = RequirementCatalog::parse(&requirements);

    let resolver = workspace.resolver(feature)?;
    let mut documents = BTreeMap::new();
    for document in DocumentType::ALL {
        if let Some(content) = repo.read_document(feature, document)? {
            let origin = repo.spec_dir(feature).join(document.file_name());
            documents.insert(document, resolver.substitute_document(&content, &origin)?);
        }
    }

    let (task, clauses, message) = match selected {
        Some(task) => {
            let clauses = task
                .requirements
                .iter()
                .filter_map(|reference| catalog.get(reference))
                .map(|clause| ClauseView {
                    reference: clause.reference.to_string(),
                    text: clause.text.clone(),
                })
                .collect();
            let mut task = task.clone();
            if !task.status.is_completed() {
                task.status = TaskStatus::InProgress;
            }
            (Some(task), clauses, None)
        }
        None => (
            None,
            Vec::new(),
            Some("All tasks are complete".to_string()),
        ),
    };

    Ok(TaskContext {
        feature_name: feature.to_string(),
        task,
        message,
        requirements: clauses,
        progress: list.progress(),
        documents,
    })
}

/// Set a task's status, applying the completion rules
pub fn mark_task_status(workspace: &Workspace, input: MarkTaskInput) -> Result<MarkOutcome> {
    let outcome = workspace.engine().update_task_status(
        &input.feature_name,
        &input.task_id,
        input.status,
    )?;
    let change = outcome.change;
    Ok(MarkOutcome {
        feature_name: input.feature_name,
        task_id: change.task_id,
        previous: change.previous,
        status: change.status,
        reopened: change.reopened,
        warnings: change.warnings,
        progress: outcome.list.progress(),
    })
}
