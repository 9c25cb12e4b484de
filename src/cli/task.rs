//! Task commands

use super::print_findings;
use crate::models::TaskStatus;
use crate::services::{mark_task_status, next_or_named_task, MarkTaskInput, Workspace};
use crate::Result;
use clap::Subcommand;
use colored::Colorize;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Show the next task to work on (or a named one) with its requirements
    Next {
        /// Feature name
        feature: String,

        /// Task id such as 2 or 2.1
        id: Option<String>,

        /// Output the full context (including documents) as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a task's status
    Mark {
        /// Feature name
        feature: String,

        /// Task id such as 2 or 2.1
        id: String,

        /// not-started, in-progress or completed
        status: TaskStatus,
    },
}

pub fn run(cmd: TaskCommands, workspace: &Workspace) -> Result<()> {
    match cmd {
        TaskCommands::Next { feature, id, json } => {
            let context = next_or_named_task(workspace, &feature, id.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&context)?);
                return Ok(());
            }

            let Some(task) = &context.task else {
                println!(
                    "{}",
                    context
                        .message
                        .as_deref()
                        .unwrap_or("No task selected")
                        .green()
                );
                return Ok(());
            };

            println!("{} {}", format!("▶ Task {}", task.id).cyan().bold(), task.description);
            for detail in &task.details {
                println!("   - {}", detail);
            }
            for sub in &task.sub_tasks {
                println!("   {} {} {}", sub.status.checkbox(), sub.id, sub.description);
            }
            if !context.requirements.is_empty() {
                println!("\n{}", "Requirements:".green().bold());
                for clause in &context.requirements {
                    println!("   {} {}", clause.reference.bold(), clause.text);
                }
            }
            println!(
                "\n   Progress: {} ({}%)",
                context.progress.ratio(),
                context.progress.percentage
            );
        }
        TaskCommands::Mark {
            feature,
            id,
            status,
        } => {
            let outcome = mark_task_status(
                workspace,
                MarkTaskInput {
                    feature_name: feature,
                    task_id: id,
                    status,
                },
            )?;

            println!(
                "{}",
                format!(
                    "✅ Task {}: {} → {}",
                    outcome.task_id, outcome.previous, outcome.status
                )
                .green()
            );
            for parent in &outcome.reopened {
                println!("{}", format!("   Task {} reopened", parent).yellow());
            }
            println!("   Progress: {}", outcome.progress.ratio());
            print_findings(&outcome.warnings);
        }
    }
    Ok(())
}
