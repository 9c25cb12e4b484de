//! Document service - whole-document reads and writes

use super::Workspace;
use crate::error::SpecError;
use crate::models::{DocumentType, Finding, Phase};
use crate::parser::requirements::RequirementCatalog;
use crate::storage::SpecRepository;
use crate::workflow::UpdateOutcome;
use crate::Result;
use serde::Serialize;

/// Input structure for writing a document
#[derive(Debug, Clone)]
pub struct UpdateDocumentInput {
    pub feature_name: String,
    pub document: DocumentType,
    pub content: String,
    pub approval_granted: bool,
}

/// Input structure for reading a document
#[derive(Debug, Clone)]
pub struct ReadDocumentInput {
    pub feature_name: String,
    pub document: DocumentType,
    /// Return stored text without resolving file references
    pub raw: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub feature_name: String,
    pub document: DocumentType,
    pub phase: Phase,
    pub approved: bool,
    /// Edited since it was approved
    pub stale: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
}

/// Replace a document through the workflow engine
pub fn update_document(workspace: &Workspace, input: UpdateDocumentInput) -> Result<UpdateOutcome> {
    let outcome = workspace.engine().record_document_update(
        &input.feature_name,
        input.document,
        &input.content,
        input.approval_granted,
    )?;
    Ok(outcome)
}

/// Read a document with file references substituted
///
/// Tasks documents are returned in canonical form with relocation and
/// linking findings. The stored text is never modified by a read.
pub fn read_document(workspace: &Workspace, input: ReadDocumentInput) -> Result<DocumentView> {
    let repo = workspace.repo();
    let feature = input.feature_name.as_str();
    let spec = repo.load(feature)?;
    let stored = repo
        .read_document(feature, input.document)?
        .ok_or_else(|| SpecError::DocumentNotFound {
            feature: feature.to_string(),
            document: input.document,
        })?;

    let mut findings = Vec::new();
    let mut content = match input.document {
        DocumentType::Tasks => {
            let requirements = repo
                .read_document(feature, DocumentType::Requirements)?
                .unwrap_or_default();
            let canonical = workspace
                .processor()
                .canonicalize(&stored, &RequirementCatalog::parse(&requirements))?;
            findings = canonical.findings;
            canonical.content
        }
        _ => stored.clone(),
    };

    if !input.raw {
        let origin = repo.spec_dir(feature).join(input.document.file_name());
        content = workspace
            .resolver(feature)?
            .substitute_document(&content, &origin)?;
    }

    Ok(DocumentView {
        feature_name: spec.feature_name.clone(),
        document: input.document,
        phase: spec.phase,
        approved: spec.is_approved(input.document),
        stale: spec.is_stale(input.document, &stored),
        content,
        findings,
    })
}
