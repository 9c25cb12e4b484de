//! Spec service - create, list, inspect and delete specifications

use super::Workspace;
use crate::models::{DocumentType, Phase, Progress, Specification};
use crate::storage::{validate_feature_name, SpecRepository};
use crate::workflow::generate::generate_requirements;
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Input structure for creating a specification
#[derive(Debug, Clone)]
pub struct CreateSpecInput {
    pub feature_name: String,
    pub initial_idea: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    pub feature_name: String,
    pub phase: Phase,
    pub path: PathBuf,
    pub documents: Vec<DocumentType>,
}

/// Listing entry of one specification
#[derive(Debug, Clone, Serialize)]
pub struct SpecSummary {
    pub feature_name: String,
    pub phase: Phase,
    pub documents: Vec<DocumentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    /// "completed/total completed" for the tasks document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_completion: Option<String>,
    /// Approved documents edited since their approval
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stale: Vec<DocumentType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Phase details of one specification
#[derive(Debug, Clone, Serialize)]
pub struct SpecStatus {
    #[serde(flatten)]
    pub summary: SpecSummary,
    pub approved: Vec<DocumentType>,
    /// The current document would pass its exit criteria if approved
    pub ready_to_advance: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_phase: Option<Phase>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub feature_name: String,
    pub removed_files: Vec<String>,
}

/// Create a specification with an initial requirements document
pub fn create_specification(workspace: &Workspace, input: CreateSpecInput) -> Result<CreateOutcome> {
    validate_feature_name(&input.feature_name)?;
    let idea = input.initial_idea.trim();
    if idea.is_empty() {
        anyhow::bail!("initial idea must not be empty");
    }

    let repo = workspace.repo();
    let spec = Specification::new(&input.feature_name, idea);
    repo.create(&spec)?;

    let requirements = generate_requirements(&input.feature_name, idea);
    if let Err(err) =
        repo.write_document(&input.feature_name, DocumentType::Requirements, &requirements)
    {
        // Leave no half-created bundle behind
        repo.delete(&input.feature_name)
            .with_context(|| format!("Failed to clean up '{}'", input.feature_name))?;
        return Err(err.into());
    }

    info!(feature = %input.feature_name, "created specification");
    Ok(CreateOutcome {
        path: repo.spec_dir(&input.feature_name),
        feature_name: input.feature_name,
        phase: spec.phase,
        documents: vec![DocumentType::Requirements],
    })
}

/// Summaries of all specifications, sorted by feature name
pub fn list_specifications(workspace: &Workspace) -> Result<Vec<SpecSummary>> {
    workspace
        .repo()
        .list()?
        .iter()
        .map(|feature| summarize(workspace, feature))
        .collect()
}

/// Phase, approvals and readiness of one specification
pub fn specification_status(workspace: &Workspace, feature: &str) -> Result<SpecStatus> {
    let summary = summarize(workspace, feature)?;
    let spec = workspace.repo().load(feature)?;
    let ready_to_advance = workspace.engine().can_advance(feature, true)?;
    Ok(SpecStatus {
        approved: spec.approvals.keys().copied().collect(),
        ready_to_advance,
        next_phase: spec.phase.next(),
        summary,
    })
}

/// Remove a specification and all of its documents
pub fn delete_specification(workspace: &Workspace, feature: &str) -> Result<DeleteOutcome> {
    let removed_files = workspace.repo().delete(feature)?;
    Ok(DeleteOutcome {
        feature_name: feature.to_string(),
        removed_files,
    })
}

fn summarize(workspace: &Workspace, feature: &str) -> Result<SpecSummary> {
    let repo = workspace.repo();
    let spec = repo.load(feature)?;

    let mut documents = Vec::new();
    let mut stale = Vec::new();
    let mut progress = None;
    for document in DocumentType::ALL {
        let Some(content) = repo.read_document(feature, document)? else {
            continue;
        };
        documents.push(document);
        if spec.is_stale(document, &content) {
            stale.push(document);
        }
        if document == DocumentType::Tasks {
            match workspace.processor().parse(&content) {
                Ok(parsed) => progress = Some(parsed.list.progress()),
                Err(err) => warn!(feature, error = %err, "tasks document does not parse"),
            }
        }
    }

    Ok(SpecSummary {
        feature_name: spec.feature_name,
        phase: spec.phase,
        documents,
        task_completion: progress.as_ref().map(Progress::ratio),
        progress,
        stale,
        created_at: spec.created_at,
        updated_at: spec.updated_at,
    })
}
