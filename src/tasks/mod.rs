//! Task list processing: canonical formatting, requirement linking and
//! completion rules for tasks documents.
//!
//! The task model is recomputed from document text on every call; nothing
//! is cached between operations.

pub mod completion;
pub mod format;
pub mod linker;
pub mod relocation;

pub use completion::{next_task, StatusChange};
pub use linker::{KeywordOverlapLinker, NoLinker, RequirementLinker};

use crate::config::LinkingConfig;
use crate::error::SpecResult;
use crate::models::{Finding, FindingCategory, Severity, Task, TaskList, TaskStatus};
use crate::parser::requirements::RequirementCatalog;
use crate::parser::tasks::{parse_tasks, ParsedTasks};
use tracing::debug;

/// Canonical form of a tasks document plus everything noticed on the way
#[derive(Debug, Clone)]
pub struct CanonicalTasks {
    pub content: String,
    pub list: TaskList,
    pub findings: Vec<Finding>,
}

impl CanonicalTasks {
    pub fn findings_in(&self, category: FindingCategory) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.category == category)
    }
}

pub struct TaskListProcessor {
    linker: Box<dyn RequirementLinker>,
}

impl TaskListProcessor {
    pub fn new(linker: Box<dyn RequirementLinker>) -> Self {
        Self { linker }
    }

    pub fn from_config(config: &LinkingConfig) -> Self {
        Self::new(linker::linker_for(config))
    }

    pub fn parse(&self, content: &str) -> SpecResult<ParsedTasks> {
        parse_tasks(content)
    }

    /// Parse and re-serialize a tasks document
    ///
    /// Unannotated leaf tasks are linked against `requirements` when the
    /// linker is confident and reported as unlinked otherwise. Prose outside
    /// the task grammar is dropped from the output and reported with a
    /// suggested destination.
    pub fn canonicalize(
        &self,
        content: &str,
        requirements: &RequirementCatalog,
    ) -> SpecResult<CanonicalTasks> {
        let ParsedTasks {
            mut list,
            prose,
            findings: parse_findings,
        } = parse_tasks(content)?;

        let mut findings = Vec::new();
        for task in &mut list.tasks {
            if task.is_leaf() {
                self.link_task(task, requirements, &mut findings);
            } else {
                for sub in &mut task.sub_tasks {
                    self.link_task(sub, requirements, &mut findings);
                }
            }
        }

        for block in prose {
            let destination = relocation::classify(&block.text);
            findings.push(
                Finding::new(
                    format!(
                        "text outside the task list was removed from tasks; consider moving it to {}",
                        destination.describe()
                    ),
                    Some(block.line),
                    Severity::Medium,
                    FindingCategory::RelocatedProse,
                )
                .with_content(block.text)
                .with_destination(destination),
            );
        }
        findings.extend(parse_findings);

        let content = format::render(&list);
        Ok(CanonicalTasks {
            content,
            list,
            findings,
        })
    }

    fn link_task(
        &self,
        task: &mut Task,
        requirements: &RequirementCatalog,
        findings: &mut Vec<Finding>,
    ) {
        if !task.requirements.is_empty() {
            return;
        }

        let mut text = task.description.clone();
        for detail in &task.details {
            text.push(' ');
            text.push_str(detail);
        }

        let refs = self.linker.link(&text, requirements);
        if refs.is_empty() {
            findings.push(
                Finding::new(
                    format!(
                        "task {} has no requirement references and no confident match; review it",
                        task.id
                    ),
                    Some(task.line).filter(|line| *line > 0),
                    Severity::Low,
                    FindingCategory::UnlinkedTask,
                )
                .with_content(task.id.clone()),
            );
            return;
        }

        let joined: Vec<String> = refs.iter().map(|r| r.to_string()).collect();
        debug!(
            task = %task.id,
            linker = self.linker.name(),
            refs = %joined.join(", "),
            "linked task to requirements"
        );
        findings.push(
            Finding::new(
                format!(
                    "task {} linked to requirements {} by {}",
                    task.id,
                    joined.join(", "),
                    self.linker.name()
                ),
                Some(task.line).filter(|line| *line > 0),
                Severity::Low,
                FindingCategory::LinkedTask,
            )
            .with_content(task.id.clone()),
        );
        task.requirements = refs;
    }

    /// Canonicalize after applying a status change to one task
    pub fn set_status(
        &self,
        content: &str,
        feature: &str,
        task_id: &str,
        status: TaskStatus,
        requirements: &RequirementCatalog,
    ) -> SpecResult<(String, TaskList, StatusChange)> {
        let mut list = parse_tasks(content)?.list;
        let change = completion::apply_status(&mut list, feature, task_id, status, requirements)?;
        Ok((format::render(&list), list, change))
    }
}

impl Default for TaskListProcessor {
    fn default() -> Self {
        Self::new(Box::new(KeywordOverlapLinker::default()))
    }
}
