//! Tasks document parser
//!
//! Builds the hierarchical [`TaskList`] from the line tokens of
//! [`super::task_grammar`]. Parsing is tolerant: lines that do not belong to
//! a task are collected as prose blocks instead of failing, and so are
//! checkboxes without a description. Only ambiguity that cannot be resolved
//! without guessing (indentation deeper than one sub-task level) is reported
//! as an error.
//!
//! Tasks are renumbered while parsing, so ids in the returned list are the
//! canonical ids: top-level `1..N`, sub-tasks `N.1..N.M`.

use super::task_grammar::{split_inline_annotation, tokenize_line, LineToken};
use crate::error::{SpecError, SpecResult};
use crate::models::{ClauseRef, Finding, FindingCategory, Severity, Task, TaskList, TaskStatus};

/// Text found outside the task grammar
#[derive(Debug, Clone, PartialEq)]
pub struct ProseBlock {
    /// First line of the block (1-indexed)
    pub line: usize,
    pub text: String,
}

/// Result of parsing a tasks document
#[derive(Debug, Clone, Default)]
pub struct ParsedTasks {
    pub list: TaskList,
    /// Prose excluded from the task model, in document order
    pub prose: Vec<ProseBlock>,
    /// Recoverable problems (malformed requirement references)
    pub findings: Vec<Finding>,
}

/// Position of the entry that detail lines currently attach to
#[derive(Debug, Clone, Copy)]
enum Cursor {
    Top { index: usize },
    Sub { index: usize, sub: usize, indent: usize },
}

#[derive(Default)]
struct ParseState {
    tasks: Vec<Task>,
    prose: Vec<ProseBlock>,
    findings: Vec<Finding>,
    pending_prose: Option<ProseBlock>,
    cursor: Option<Cursor>,
    /// Indentation of top-level entries, fixed by the first checkbox
    top_indent: Option<usize>,
    /// Indentation of the first sub-task under the current parent
    sub_indent: Option<usize>,
    /// Identifier of the current parent as written in the source
    parent_source_id: Option<String>,
    title_seen: bool,
}

/// Parse a tasks document
pub fn parse_tasks(content: &str) -> SpecResult<ParsedTasks> {
    let mut state = ParseState::default();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        match tokenize_line(line) {
            LineToken::Blank => state.flush_prose(),
            LineToken::Heading { level, text } => {
                state.flush_prose();
                state.cursor = None;
                if level == 1 && !state.title_seen && state.tasks.is_empty() {
                    state.title_seen = true;
                } else {
                    state.prose.push(ProseBlock {
                        line: line_no,
                        text: format!("{} {}", "#".repeat(level), text),
                    });
                }
            }
            LineToken::Checkbox {
                indent,
                completed,
                identifier,
                description,
            } => {
                state.flush_prose();
                if !state.push_checkbox(line_no, indent, completed, identifier, description)? {
                    state.cursor = None;
                    state.add_prose(line_no, line.trim());
                }
            }
            LineToken::Annotation { indent, refs } => match state.owner(indent) {
                Some(cursor) => {
                    state.flush_prose();
                    state.attach_refs(cursor, refs, line_no);
                }
                None => state.add_prose(line_no, line.trim()),
            },
            LineToken::Bullet { text: "", .. } => {}
            LineToken::Bullet { indent, text } => match state.owner(indent) {
                Some(cursor) => {
                    state.flush_prose();
                    state.task_mut(cursor).details.push(text.to_string());
                }
                None => state.add_prose(line_no, line.trim()),
            },
            LineToken::Text { indent, text } => match state.owner(indent) {
                Some(cursor) if !looks_like_checkbox(text) => {
                    state.flush_prose();
                    state.task_mut(cursor).details.push(text.to_string());
                }
                _ => {
                    state.cursor = None;
                    state.add_prose(line_no, text);
                }
            },
        }
    }
    state.flush_prose();

    Ok(ParsedTasks {
        list: TaskList { tasks: state.tasks },
        prose: state.prose,
        findings: state.findings,
    })
}

/// Text such as "[x] foo" would read back as a checkbox once rendered as a detail bullet
fn looks_like_checkbox(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next() == Some('[')
        && match chars.next() {
            Some(']') => true,
            Some(_) => chars.next() == Some(']'),
            None => false,
        }
}

impl ParseState {
    /// Add a checkbox entry; returns false when it has no description
    fn push_checkbox(
        &mut self,
        line_no: usize,
        indent: usize,
        completed: bool,
        identifier: Option<&str>,
        description: &str,
    ) -> SpecResult<bool> {
        // "2.0.1 release notes" is a description, not a third nesting level
        let folded;
        let (identifier, description) = match identifier {
            Some(id) if id.split('.').count() > 2 => {
                folded = format!("{} {}", id, description);
                (None, folded.trim())
            }
            _ => (identifier, description),
        };

        let (description, inline_refs) = split_inline_annotation(description);
        if description.is_empty() {
            return Ok(false);
        }

        let status = if completed {
            TaskStatus::Completed
        } else {
            TaskStatus::NotStarted
        };

        let top_indent = *self.top_indent.get_or_insert(indent);
        let is_sub = if indent > top_indent {
            match self.sub_indent {
                Some(sub_indent) if indent > sub_indent => {
                    return Err(SpecError::validation(
                        format!(
                            "task '{}' is nested below a sub-task; only one level of sub-tasks is allowed",
                            description
                        ),
                        Some(line_no),
                    ));
                }
                _ => true,
            }
        } else {
            // Flat listing of "2.1" directly below "2."
            match (identifier, &self.parent_source_id) {
                (Some(id), Some(parent)) => id
                    .split_once('.')
                    .map(|(prefix, _)| prefix == parent)
                    .unwrap_or(false),
                _ => false,
            }
        };

        if is_sub {
            let Some(index) = self.tasks.len().checked_sub(1) else {
                return Err(SpecError::validation(
                    "sub-task appears before any top-level task",
                    Some(line_no),
                ));
            };
            if indent > top_indent && self.sub_indent.is_none() {
                self.sub_indent = Some(indent);
            }
            let parent = &mut self.tasks[index];
            let sub = parent.sub_tasks.len();
            parent.sub_tasks.push(Task {
                id: format!("{}.{}", index + 1, sub + 1),
                description,
                status,
                details: Vec::new(),
                requirements: Vec::new(),
                parent: Some(parent.id.clone()),
                sub_tasks: Vec::new(),
                line: line_no,
            });
            self.cursor = Some(Cursor::Sub { index, sub, indent });
        } else {
            let index = self.tasks.len();
            self.tasks.push(Task {
                id: (index + 1).to_string(),
                description,
                status,
                details: Vec::new(),
                requirements: Vec::new(),
                parent: None,
                sub_tasks: Vec::new(),
                line: line_no,
            });
            self.sub_indent = None;
            self.parent_source_id = identifier.map(|id| id.to_string());
            self.cursor = Some(Cursor::Top { index });
        }

        if let (Some(refs), Some(cursor)) = (inline_refs, self.cursor) {
            self.attach_refs(cursor, &refs, line_no);
        }
        Ok(true)
    }

    /// Entry that an indented line at `indent` belongs to
    fn owner(&self, indent: usize) -> Option<Cursor> {
        let top_indent = self.top_indent?;
        match self.cursor? {
            Cursor::Sub {
                index,
                indent: sub_indent,
                ..
            } if indent <= sub_indent => {
                if indent > top_indent {
                    Some(Cursor::Top { index })
                } else {
                    None
                }
            }
            cursor @ Cursor::Sub { .. } => Some(cursor),
            cursor @ Cursor::Top { .. } if indent > top_indent => Some(cursor),
            Cursor::Top { .. } => None,
        }
    }

    fn task_mut(&mut self, cursor: Cursor) -> &mut Task {
        match cursor {
            Cursor::Top { index } => &mut self.tasks[index],
            Cursor::Sub { index, sub, .. } => &mut self.tasks[index].sub_tasks[sub],
        }
    }

    fn attach_refs(&mut self, cursor: Cursor, refs: &str, line_no: usize) {
        let mut malformed = Vec::new();
        let task = self.task_mut(cursor);
        for raw in refs.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            match raw.parse::<ClauseRef>() {
                Ok(reference) => {
                    if !task.requirements.contains(&reference) {
                        task.requirements.push(reference);
                    }
                }
                Err(reason) => malformed.push((task.id.clone(), raw.to_string(), reason)),
            }
        }
        for (task_id, raw, reason) in malformed {
            self.findings.push(
                Finding::new(
                    format!(
                        "task {}: dropped requirement reference '{}' ({})",
                        task_id, raw, reason
                    ),
                    Some(line_no),
                    Severity::Medium,
                    FindingCategory::MalformedReference,
                )
                .with_content(raw),
            );
        }
    }

    fn add_prose(&mut self, line_no: usize, text: &str) {
        match &mut self.pending_prose {
            Some(block) => {
                block.text.push('\n');
                block.text.push_str(text);
            }
            None => {
                self.pending_prose = Some(ProseBlock {
                    line: line_no,
                    text: text.to_string(),
                })
            }
        }
    }

    fn flush_prose(&mut self) {
        if let Some(block) = self.pending_prose.take() {
            self.prose.push(block);
        }
    }
}
