//! Status changes, completion rules and next-task selection

use crate::error::{SpecError, SpecResult};
use crate::models::{Finding, FindingCategory, Severity, Task, TaskList, TaskStatus};
use crate::parser::requirements::RequirementCatalog;
use serde::Serialize;

/// Outcome of a status change on the task model
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub task_id: String,
    pub previous: TaskStatus,
    pub status: TaskStatus,
    /// Parents reopened because one of their sub-tasks was reopened
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reopened: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Finding>,
}

/// Fail if any completed parent still has incomplete sub-tasks
pub fn check_hierarchy(list: &TaskList) -> SpecResult<()> {
    for task in &list.tasks {
        if task.status.is_completed() {
            let incomplete = task.incomplete_sub_tasks();
            if !incomplete.is_empty() {
                return Err(SpecError::TaskHierarchyViolation {
                    task: task.id.clone(),
                    incomplete,
                });
            }
        }
    }
    Ok(())
}

/// Warnings for references of `task` that name no existing clause
pub fn dangling_references(task: &Task, catalog: &RequirementCatalog) -> Vec<Finding> {
    task.requirements
        .iter()
        .filter(|reference| !catalog.contains(reference))
        .map(|reference| {
            let mut finding = Finding::warning(&SpecError::DanglingRequirementReference {
                task: task.id.clone(),
                reference: reference.to_string(),
            });
            finding.line = Some(task.line).filter(|line| *line > 0);
            finding.content = Some(reference.to_string());
            finding
        })
        .collect()
}

/// Dangling-reference warnings for every task of the list
pub fn all_dangling_references(list: &TaskList, catalog: &RequirementCatalog) -> Vec<Finding> {
    list.iter()
        .flat_map(|task| dangling_references(task, catalog))
        .collect()
}

/// Apply a status change after checking the completion rules
///
/// Completing a task requires all of its sub-tasks to be completed.
/// References to missing clauses do not block completion; they are
/// returned as warnings. Reopening a sub-task of a completed parent
/// reopens the parent as well.
pub fn apply_status(
    list: &mut TaskList,
    feature: &str,
    task_id: &str,
    status: TaskStatus,
    catalog: &RequirementCatalog,
) -> SpecResult<StatusChange> {
    let task = list.find(task_id).ok_or_else(|| SpecError::TaskNotFound {
        feature: feature.to_string(),
        task: task_id.to_string(),
    })?;
    let id = task.id.clone();
    let parent_id = task.parent.clone();
    let previous = task.status;

    let mut warnings = Vec::new();
    if status.is_completed() {
        let incomplete = task.incomplete_sub_tasks();
        if !incomplete.is_empty() {
            return Err(SpecError::TaskHierarchyViolation {
                task: id,
                incomplete,
            });
        }
        warnings = dangling_references(task, catalog);
    }

    if let Some(task) = list.find_mut(&id) {
        task.status = status;
    }

    let mut reopened = Vec::new();
    if !status.is_completed() {
        if let Some(parent) = parent_id.as_deref().and_then(|p| list.find_mut(p)) {
            if parent.status.is_completed() {
                parent.status = TaskStatus::NotStarted;
                reopened.push(parent.id.clone());
                warnings.push(
                    Finding::new(
                        format!(
                            "task {} was reopened because sub-task {} is no longer completed",
                            parent.id, id
                        ),
                        None,
                        Severity::Low,
                        FindingCategory::ReopenedParent,
                    )
                    .with_content(parent.id.clone()),
                );
            }
        }
    }

    Ok(StatusChange {
        task_id: id,
        previous,
        status,
        reopened,
        warnings,
    })
}

/// First task to work on, in document order
///
/// Sub-tasks are offered before their parent; a parent whose sub-tasks are
/// all completed is offered itself.
pub fn next_task(list: &TaskList) -> Option<&Task> {
    list.tasks
        .iter()
        .filter(|task| !task.status.is_completed())
        .map(|task| {
            task.sub_tasks
                .iter()
                .find(|sub| !sub.status.is_completed())
                .unwrap_or(task)
        })
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClauseRef;
    use crate::parser::tasks::parse_tasks;

    const REQUIREMENTS: &str = "### Requirement 1\n\n1. WHEN a THEN the system SHALL b\n";

    fn list(content: &str) -> TaskList {
        parse_tasks(content).unwrap().list
    }

    #[test]
    fn test_next_task_prefers_sub_tasks() {
        let tasks = list("- [ ] 1. Parent\n  - [x] 1.1 Done\n  - [ ] 1.2 Open\n- [ ] 2. Later\n");
        assert_eq!(next_task(&tasks).map(|t| t.id.as_str()), Some("1.2"));
    }

    #[test]
    fn test_next_task_parent_with_completed_sub_tasks() {
        let tasks = list("- [ ] 1. Parent\n  - [x] 1.1 Done\n  - [x] 1.2 Done\n- [ ] 2. Later\n");
        assert_eq!(next_task(&tasks).map(|t| t.id.as_str()), Some("1"));
    }

    #[test]
    fn test_next_task_skips_completed() {
        let tasks = list("- [x] 1. Done\n- [ ] 2. Open\n");
        assert_eq!(next_task(&tasks).map(|t| t.id.as_str()), Some("2"));

        let tasks = list("- [x] 1. Done\n");
        assert!(next_task(&tasks).is_none());
    }

    #[test]
    fn test_complete_parent_with_open_sub_task_fails() {
        let mut tasks = list("- [ ] 1. Parent\n  - [x] 1.1 Done\n  - [ ] 1.2 Open\n");
        let catalog = RequirementCatalog::parse(REQUIREMENTS);
        let err = apply_status(&mut tasks, "demo", "1", TaskStatus::Completed, &catalog)
            .unwrap_err();
        match err {
            SpecError::TaskHierarchyViolation { task, incomplete } => {
                assert_eq!(task, "1");
                assert_eq!(incomplete, vec!["1.2"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(tasks.find("1").unwrap().status, TaskStatus::NotStarted);
    }

    #[test]
    fn test_dangling_reference_is_warning() {
        let mut tasks = list("- [ ] 1. Build\n  - _Requirements: 1.1, 4.2_\n");
        let catalog = RequirementCatalog::parse(REQUIREMENTS);
        let change =
            apply_status(&mut tasks, "demo", "1", TaskStatus::Completed, &catalog).unwrap();
        assert_eq!(change.status, TaskStatus::Completed);
        assert_eq!(change.warnings.len(), 1);
        assert_eq!(change.warnings[0].category, FindingCategory::DanglingReference);
        assert_eq!(change.warnings[0].content.as_deref(), Some("4.2"));
        assert_eq!(tasks.find("1").unwrap().status, TaskStatus::Completed);
        assert_eq!(tasks.find("1").unwrap().requirements[1], ClauseRef::new(4, 2));
    }

    #[test]
    fn test_reopening_sub_task_reopens_parent() {
        let mut tasks = list("- [x] 1. Parent\n  - [x] 1.1 Done\n");
        let catalog = RequirementCatalog::default();
        let change =
            apply_status(&mut tasks, "demo", "1.1", TaskStatus::NotStarted, &catalog).unwrap();
        assert_eq!(change.reopened, vec!["1"]);
        assert_eq!(tasks.find("1").unwrap().status, TaskStatus::NotStarted);
        assert!(check_hierarchy(&tasks).is_ok());
    }

    #[test]
    fn test_unknown_task() {
        let mut tasks = list("- [ ] 1. Only\n");
        let err = apply_status(
            &mut tasks,
            "demo",
            "7",
            TaskStatus::Completed,
            &RequirementCatalog::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::TaskNotFound { .. }));
    }

    #[test]
    fn test_check_hierarchy() {
        assert!(check_hierarchy(&list("- [x] 1. Parent\n  - [ ] 1.1 Open\n")).is_err());
        assert!(check_hierarchy(&list("- [x] 1. Parent\n  - [x] 1.1 Done\n")).is_ok());
    }
}
