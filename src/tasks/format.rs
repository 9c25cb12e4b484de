//! Canonical serialization of the task model
//!
//! ```text
//! # Implementation Plan
//!
//! - [ ] 1. Description
//!   - detail
//!   - _Requirements: 1.1, 2.3_
//!   - [x] 1.1 Sub-task description
//!     - _Requirements: 1.2_
//!
//! - [ ] 2. Next task
//! ```

use crate::models::{Task, TaskList};

pub const TITLE: &str = "# Implementation Plan";

const INDENT: &str = "  ";

/// Render a task list in canonical form
pub fn render(list: &TaskList) -> String {
    let mut out = String::with_capacity(64 * (list.tasks.len() + 1));
    out.push_str(TITLE);
    out.push('\n');

    for task in &list.tasks {
        out.push('\n');
        render_entry(&mut out, task, 0);
        for sub in &task.sub_tasks {
            render_entry(&mut out, sub, 1);
        }
    }
    out
}

fn render_entry(out: &mut String, task: &Task, depth: usize) {
    let pad = INDENT.repeat(depth);
    let label = if depth == 0 {
        format!("{}.", task.id)
    } else {
        task.id.clone()
    };
    out.push_str(&format!(
        "{}- {} {} {}\n",
        pad,
        task.status.checkbox(),
        label,
        task.description
    ));
    for detail in &task.details {
        out.push_str(&format!("{}{}- {}\n", pad, INDENT, detail));
    }
    if !task.requirements.is_empty() {
        let refs: Vec<String> = task.requirements.iter().map(|r| r.to_string()).collect();
        out.push_str(&format!(
            "{}{}- _Requirements: {}_\n",
            pad,
            INDENT,
            refs.join(", ")
        ));
    }
}
