//! Document commands

use super::print_findings;
use crate::models::DocumentType;
use crate::services::{
    read_document, update_document, ReadDocumentInput, UpdateDocumentInput, Workspace,
};
use crate::Result;
use anyhow::Context;
use colored::Colorize;
use std::io::Read;
use std::path::Path;

/// Where new document content comes from
pub enum ContentSource<'a> {
    File(&'a Path),
    Stdin,
}

impl ContentSource<'_> {
    fn read(&self) -> Result<String> {
        match self {
            ContentSource::File(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display())),
            ContentSource::Stdin => {
                let mut content = String::new();
                std::io::stdin()
                    .read_to_string(&mut content)
                    .context("Failed to read stdin")?;
                Ok(content)
            }
        }
    }
}

pub fn read(
    workspace: &Workspace,
    feature_name: &str,
    document: DocumentType,
    raw: bool,
    json: bool,
) -> Result<()> {
    let view = read_document(
        workspace,
        ReadDocumentInput {
            feature_name: feature_name.to_string(),
            document,
            raw,
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    print!("{}", view.content);
    if !view.content.ends_with('\n') {
        println!();
    }
    if view.stale {
        eprintln!(
            "{}",
            format!("⚠ {} was edited since it was approved", document).yellow()
        );
    }
    print_findings(&view.findings);
    Ok(())
}

pub fn update(
    workspace: &Workspace,
    feature_name: &str,
    document: DocumentType,
    source: ContentSource<'_>,
    approve: bool,
) -> Result<()> {
    let content = source.read()?;
    let outcome = update_document(
        workspace,
        UpdateDocumentInput {
            feature_name: feature_name.to_string(),
            document,
            content,
            approval_granted: approve,
        },
    )?;

    println!(
        "{}",
        format!("✅ Updated {} of '{}'", document, outcome.feature).green()
    );
    if outcome.advanced {
        println!(
            "   Phase: {} → {} {}",
            outcome.previous_phase,
            outcome.phase.emoji(),
            outcome.phase
        );
    } else if outcome.phase != outcome.previous_phase {
        println!(
            "{}",
            format!(
                "   Revision moved the workflow back: {} → {}",
                outcome.previous_phase, outcome.phase
            )
            .yellow()
        );
    } else {
        println!("   Phase: {} {}", outcome.phase.emoji(), outcome.phase);
    }
    if let Some(generated) = outcome.generated {
        println!("   Generated starter {}", generated.file_name());
    }
    if !outcome.cleared_approvals.is_empty() {
        let cleared: Vec<&str> = outcome.cleared_approvals.iter().map(|d| d.as_str()).collect();
        println!("   Approvals cleared: {}", cleared.join(", "));
    }
    print_findings(&outcome.findings);
    Ok(())
}
