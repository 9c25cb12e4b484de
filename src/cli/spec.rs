//! Specification lifecycle commands

use crate::models::Phase;
use crate::services::{
    create_specification, delete_specification, list_specifications, specification_status,
    CreateSpecInput, Workspace,
};
use crate::Result;
use colored::Colorize;

pub fn create(workspace: &Workspace, feature_name: &str, initial_idea: &str) -> Result<()> {
    let outcome = create_specification(
        workspace,
        CreateSpecInput {
            feature_name: feature_name.to_string(),
            initial_idea: initial_idea.to_string(),
        },
    )?;

    println!(
        "{}",
        format!("✅ Created specification '{}'", outcome.feature_name).green()
    );
    println!("   Phase: {} {}", outcome.phase.emoji(), outcome.phase);
    println!("   Path:  {}", outcome.path.display());
    println!(
        "\n{}",
        "Next: review requirements.md, then approve it with 'specd approve'".cyan()
    );
    Ok(())
}

pub fn list(workspace: &Workspace, json: bool) -> Result<()> {
    let specs = list_specifications(workspace)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    if specs.is_empty() {
        println!(
            "{}",
            "No specifications found. Create one with 'specd create'.".yellow()
        );
        return Ok(());
    }

    println!("{}", "📋 Specifications:".green().bold());
    for spec in &specs {
        let documents: Vec<&str> = spec.documents.iter().map(|d| d.as_str()).collect();
        println!(
            "   • {} {} {}",
            spec.feature_name.bold(),
            spec.phase.emoji(),
            spec.phase.to_string().cyan()
        );
        println!("       documents: {}", documents.join(", "));
        if let Some(ratio) = &spec.task_completion {
            println!("       tasks:     {}", ratio);
        }
        if !spec.stale.is_empty() {
            let stale: Vec<&str> = spec.stale.iter().map(|d| d.as_str()).collect();
            println!(
                "       {}",
                format!("edited since approval: {}", stale.join(", ")).yellow()
            );
        }
    }
    Ok(())
}

pub fn phase(workspace: &Workspace, feature_name: &str, json: bool) -> Result<()> {
    let status = specification_status(workspace, feature_name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let summary = &status.summary;
    println!(
        "{} {} {}",
        summary.phase.emoji(),
        summary.feature_name.bold(),
        summary.phase.to_string().cyan()
    );
    for phase in Phase::ALL {
        let marker = if phase < summary.phase {
            "✓".green()
        } else if phase == summary.phase {
            "▶".cyan()
        } else {
            "·".dimmed()
        };
        println!("   {} {}", marker, phase);
    }
    if let Some(progress) = &summary.progress {
        println!("\n   Tasks: {} ({}%)", progress.ratio(), progress.percentage);
    }

    match (status.next_phase, status.ready_to_advance) {
        (Some(next), true) => println!(
            "\n{}",
            format!("Ready to advance to {} once approved ('specd approve {}')", next, feature_name).green()
        ),
        (Some(_), false) => println!(
            "\n{}",
            "The current document does not meet its exit criteria yet".yellow()
        ),
        (None, _) => println!("\n{}", "Workflow complete".green()),
    }
    Ok(())
}

pub fn approve(workspace: &Workspace, feature_name: &str) -> Result<()> {
    let engine = workspace.engine();
    let from = engine.current_phase(feature_name)?;
    let to = engine.approve(feature_name)?;

    if from == to {
        println!("{}", "Workflow already complete".green());
    } else {
        println!(
            "{}",
            format!("✅ {} → {} {}", from, to.emoji(), to).green()
        );
    }
    Ok(())
}

pub fn delete(workspace: &Workspace, feature_name: &str) -> Result<()> {
    let outcome = delete_specification(workspace, feature_name)?;
    println!(
        "{}",
        format!("🗑  Deleted specification '{}'", outcome.feature_name).green()
    );
    for file in &outcome.removed_files {
        println!("   • {}", file);
    }
    Ok(())
}
