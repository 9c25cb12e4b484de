use super::generate::{generate_design, generate_tasks};
use super::rules::rules_for;
use crate::error::{SpecError, SpecResult};
use crate::models::{
    DocumentType, Finding, FindingCategory, Phase, Severity, Specification, TaskList, TaskStatus,
};
use crate::parser::requirements::RequirementCatalog;
use crate::storage::SpecRepository;
use crate::tasks::completion::{all_dangling_references, check_hierarchy};
use crate::tasks::{StatusChange, TaskListProcessor};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Result of a document write
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub feature: String,
    pub document: DocumentType,
    pub previous_phase: Phase,
    pub phase: Phase,
    /// An approval was recorded for the written document
    pub approved: bool,
    pub advanced: bool,
    /// Approvals cleared because an earlier document was revised
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cleared_approvals: Vec<DocumentType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
    /// Starter document written for the phase entered by this update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated: Option<DocumentType>,
    /// Content as stored (canonical form for tasks)
    #[serde(skip)]
    pub content: String,
}

/// Result of a task status change
#[derive(Debug, Clone)]
pub struct TaskStatusOutcome {
    pub change: StatusChange,
    pub list: TaskList,
}

/// Phase-transition gatekeeper of a specification
///
/// Every document write goes through [`WorkflowEngine::record_document_update`].
/// The phase is read from and written back to the repository on each call.
pub struct WorkflowEngine<'a, R: SpecRepository + ?Sized> {
    repo: &'a R,
    processor: &'a TaskListProcessor,
    max_document_size: usize,
}

impl<'a, R: SpecRepository + ?Sized> WorkflowEngine<'a, R> {
    pub fn new(repo: &'a R, processor: &'a TaskListProcessor, max_document_size: usize) -> Self {
        Self {
            repo,
            processor,
            max_document_size,
        }
    }

    pub fn current_phase(&self, feature: &str) -> SpecResult<Phase> {
        Ok(self.repo.load(feature)?.phase)
    }

    /// True iff approval is granted and the current phase's document meets
    /// its exit criteria
    pub fn can_advance(&self, feature: &str, approval_granted: bool) -> SpecResult<bool> {
        let spec = self.repo.load(feature)?;
        if !approval_granted {
            return Ok(false);
        }
        let Some(document) = spec.phase.document() else {
            return Ok(false);
        };
        let content = self.repo.read_document(feature, document)?;
        Ok(self.exit_check(&spec, document, content.as_deref()).is_ok())
    }

    /// Move to the next phase once the current document is approved
    ///
    /// The approval must match the document's current content. At COMPLETE
    /// this is a no-op.
    pub fn advance(&self, feature: &str) -> SpecResult<Phase> {
        let mut spec = self.repo.load(feature)?;
        let Some(document) = spec.phase.document() else {
            return Ok(Phase::Complete);
        };

        let content = self.repo.read_document(feature, document)?;
        self.exit_check(&spec, document, content.as_deref())?;
        let current = content.unwrap_or_default();
        if !spec.is_approved(document) || spec.is_stale(document, &current) {
            return Err(SpecError::InvalidPhaseTransition {
                feature: feature.to_string(),
                from: spec.phase,
                reason: format!("the {} document has not been approved", document),
            });
        }

        let phase = self.step(&mut spec);
        spec.touch();
        self.repo.save(&spec)?;
        self.seed_document(&spec);
        Ok(phase)
    }

    /// Approve the current phase's document as stored, then advance
    pub fn approve(&self, feature: &str) -> SpecResult<Phase> {
        let mut spec = self.repo.load(feature)?;
        let Some(document) = spec.phase.document() else {
            return Ok(Phase::Complete);
        };

        let content = self.repo.read_document(feature, document)?;
        self.exit_check(&spec, document, content.as_deref())?;
        spec.approve(document, content.as_deref().unwrap_or_default());

        let phase = self.step(&mut spec);
        spec.touch();
        self.repo.save(&spec)?;
        self.seed_document(&spec);
        Ok(phase)
    }

    /// Single entry point for document writes
    ///
    /// Rejects writes whose prerequisite documents are missing, normalizes
    /// tasks content, moves the phase back when an earlier document is
    /// revised, and advances when approval accompanies the current phase's
    /// document. A rejected write persists nothing.
    pub fn record_document_update(
        &self,
        feature: &str,
        document: DocumentType,
        content: &str,
        approval_granted: bool,
    ) -> SpecResult<UpdateOutcome> {
        if content.len() > self.max_document_size {
            return Err(SpecError::DocumentTooLarge {
                document,
                size: content.len(),
                limit: self.max_document_size,
            });
        }

        let mut spec = self.repo.load(feature)?;
        let previous_phase = spec.phase;
        self.check_prerequisites(&spec, document)?;

        let previous_content = self.repo.read_document(feature, document)?;
        let mut findings = Vec::new();
        let mut revised_list = None;
        let stored = match document {
            DocumentType::Tasks => {
                let requirements = self
                    .repo
                    .read_document(feature, DocumentType::Requirements)?
                    .unwrap_or_default();
                let catalog = RequirementCatalog::parse(&requirements);
                let canonical = self.processor.canonicalize(content, &catalog)?;
                check_hierarchy(&canonical.list)?;
                findings.extend(canonical.findings);
                findings.extend(all_dangling_references(&canonical.list, &catalog));
                revised_list = Some(canonical.list);
                canonical.content
            }
            _ => content.to_string(),
        };

        let mut cleared_approvals = Vec::new();
        if document.phase() < spec.phase {
            let unchanged = previous_content.as_deref() == Some(stored.as_str());
            let progress_only = match (&revised_list, previous_content.as_deref()) {
                (Some(list), Some(previous)) => self
                    .processor
                    .parse(previous)
                    .map(|parsed| parsed.list.same_structure(list))
                    .unwrap_or(false),
                _ => false,
            };
            if progress_only
                && spec.is_approved(document)
                && previous_content
                    .as_deref()
                    .is_some_and(|previous| !spec.is_stale(document, previous))
            {
                spec.approve(document, &stored);
            } else if !unchanged && !progress_only {
                cleared_approvals = spec.clear_approvals_from(document);
                spec.phase = document.phase();
                info!(
                    feature,
                    document = %document,
                    from = %previous_phase,
                    to = %spec.phase,
                    "revision moved workflow back"
                );
            }
        }

        let mut approved = false;
        if approval_granted {
            if document.phase() == previous_phase {
                self.exit_check(&spec, document, Some(&stored))?;
                spec.approve(document, &stored);
                self.step(&mut spec);
                approved = true;
            } else {
                findings.push(
                    Finding::new(
                        format!(
                            "approval ignored: {} is not the document of the current phase ({})",
                            document, previous_phase
                        ),
                        None,
                        Severity::Low,
                        FindingCategory::IgnoredApproval,
                    )
                    .with_content(document.as_str()),
                );
            }
        } else {
            // Surface structural problems early; they only block on approval
            let report = rules_for(document).check(&stored);
            findings.extend(report.findings.into_iter().map(|mut f| {
                f.severity = Severity::Medium;
                f
            }));
        }

        self.repo.write_document(feature, document, &stored)?;
        spec.touch();
        self.repo.save(&spec)?;
        let generated = if approved {
            self.seed_document(&spec)
        } else {
            None
        };

        debug!(feature, document = %document, approved, phase = %spec.phase, "recorded document update");
        Ok(UpdateOutcome {
            feature: feature.to_string(),
            document,
            previous_phase,
            phase: spec.phase,
            approved,
            advanced: spec.phase > previous_phase,
            cleared_approvals,
            findings,
            generated,
            content: stored,
        })
    }

    /// Change one task's status in the stored tasks document
    ///
    /// Status changes are progress tracking and never move the phase.
    pub fn update_task_status(
        &self,
        feature: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> SpecResult<TaskStatusOutcome> {
        let content = self
            .repo
            .read_document(feature, DocumentType::Tasks)?
            .ok_or_else(|| SpecError::DocumentNotFound {
                feature: feature.to_string(),
                document: DocumentType::Tasks,
            })?;
        let requirements = self
            .repo
            .read_document(feature, DocumentType::Requirements)?
            .unwrap_or_default();
        let catalog = RequirementCatalog::parse(&requirements);

        let (rendered, list, change) =
            self.processor
                .set_status(&content, feature, task_id, status, &catalog)?;
        if rendered != content {
            self.repo.write_document(feature, DocumentType::Tasks, &rendered)?;

            // A current approval follows checkbox changes
            let mut spec = self.repo.load(feature)?;
            if spec.is_approved(DocumentType::Tasks) && !spec.is_stale(DocumentType::Tasks, &content) {
                spec.approve(DocumentType::Tasks, &rendered);
                spec.touch();
                self.repo.save(&spec)?;
            }
        }

        info!(feature, task = %change.task_id, from = %change.previous, to = %change.status, "task status changed");
        Ok(TaskStatusOutcome { change, list })
    }

    fn check_prerequisites(&self, spec: &Specification, document: DocumentType) -> SpecResult<()> {
        let feature = spec.feature_name.as_str();
        for prerequisite in document.prerequisites() {
            if self.repo.read_document(feature, *prerequisite)?.is_none() {
                return Err(SpecError::MissingPrerequisiteDocument {
                    feature: feature.to_string(),
                    document,
                    prerequisite: *prerequisite,
                });
            }
        }
        if document.phase() > spec.phase {
            return Err(SpecError::MissingPrerequisiteDocument {
                feature: feature.to_string(),
                document,
                prerequisite: spec.phase.document().unwrap_or(DocumentType::Requirements),
            });
        }
        Ok(())
    }

    /// Exit criteria of the current phase: the document exists, is non-empty
    /// and passes its structural rules
    fn exit_check(
        &self,
        spec: &Specification,
        document: DocumentType,
        content: Option<&str>,
    ) -> SpecResult<()> {
        let reason = match content {
            None => format!("the {} document does not exist", document),
            Some(content) => {
                let report = rules_for(document).check(content);
                if report.is_valid() {
                    return Ok(());
                }
                report.blocking_summary()
            }
        };
        Err(SpecError::InvalidPhaseTransition {
            feature: spec.feature_name.clone(),
            from: spec.phase,
            reason,
        })
    }

    /// Write a starter document for the phase just entered, unless one exists
    ///
    /// The phase change is already persisted, so a failure here is logged and
    /// leaves the document to be written by hand.
    fn seed_document(&self, spec: &Specification) -> Option<DocumentType> {
        let document = spec.phase.document()?;
        match self.try_seed(&spec.feature_name, document) {
            Ok(true) => {
                info!(feature = %spec.feature_name, document = %document, "generated starter document");
                Some(document)
            }
            Ok(false) => None,
            Err(err) => {
                warn!(feature = %spec.feature_name, document = %document, error = %err, "could not generate starter document");
                None
            }
        }
    }

    fn try_seed(&self, feature: &str, document: DocumentType) -> SpecResult<bool> {
        if self.repo.read_document(feature, document)?.is_some() {
            return Ok(false);
        }
        let requirements = self
            .repo
            .read_document(feature, DocumentType::Requirements)?
            .unwrap_or_default();
        let content = match document {
            DocumentType::Requirements => return Ok(false),
            DocumentType::Design => generate_design(feature, &requirements),
            DocumentType::Tasks => {
                let design = self
                    .repo
                    .read_document(feature, DocumentType::Design)?
                    .unwrap_or_default();
                generate_tasks(feature, &requirements, &design)
            }
        };
        self.repo.write_document(feature, document, &content)?;
        Ok(true)
    }

    fn step(&self, spec: &mut Specification) -> Phase {
        let from = spec.phase;
        spec.phase = from.next().unwrap_or(Phase::Complete);
        info!(feature = %spec.feature_name, %from, to = %spec.phase, "phase advanced");
        spec.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsSpecRepository;
    use tempfile::TempDir;

    const REQUIREMENTS: &str = "# Requirements\n\n### Requirement 1\n\n1. WHEN a user logs in THEN the system SHALL create a session\n";
    const DESIGN: &str = "# Design\n\n## Overview\n\nSessions live in memory.\n";
    const TASKS: &str = "- [ ] 1. Create session store\n  - _Requirements: 1.1_\n";

    fn setup() -> (TempDir, FsSpecRepository, TaskListProcessor) {
        let temp_dir = TempDir::new().unwrap();
        let repo = FsSpecRepository::new(temp_dir.path().join("specs"));
        repo.create(&Specification::new("user-auth", "login system"))
            .unwrap();
        (temp_dir, repo, TaskListProcessor::default())
    }

    #[test]
    fn test_update_without_approval_keeps_phase() {
        let (_tmp, repo, processor) = setup();
        let engine = WorkflowEngine::new(&repo, &processor, 1_000_000);

        let outcome = engine
            .record_document_update("user-auth", DocumentType::Requirements, REQUIREMENTS, false)
            .unwrap();
        assert_eq!(outcome.phase, Phase::Requirements);
        assert!(!outcome.advanced);
        assert!(engine.can_advance("user-auth", true).unwrap());
        assert!(!engine.can_advance("user-auth", false).unwrap());
    }

    #[test]
    fn test_approval_advances_one_step() {
        let (_tmp, repo, processor) = setup();
        let engine = WorkflowEngine::new(&repo, &processor, 1_000_000);

        let outcome = engine
            .record_document_update("user-auth", DocumentType::Requirements, REQUIREMENTS, true)
            .unwrap();
        assert!(outcome.approved);
        assert!(outcome.advanced);
        assert_eq!(engine.current_phase("user-auth").unwrap(), Phase::Design);
    }

    #[test]
    fn test_advancing_generates_missing_documents() {
        let (_tmp, repo, processor) = setup();
        let engine = WorkflowEngine::new(&repo, &processor, 1_000_000);

        let outcome = engine
            .record_document_update("user-auth", DocumentType::Requirements, REQUIREMENTS, true)
            .unwrap();
        assert_eq!(outcome.generated, Some(DocumentType::Design));
        let design = repo
            .read_document("user-auth", DocumentType::Design)
            .unwrap()
            .unwrap();
        assert!(rules_for(DocumentType::Design).check(&design).is_valid());

        // An existing document is never replaced
        let custom = "# Tasks by hand\n\n- [ ] 1. Create session store\n";
        repo.write_document("user-auth", DocumentType::Tasks, custom)
            .unwrap();
        assert_eq!(engine.approve("user-auth").unwrap(), Phase::Tasks);
        assert_eq!(
            repo.read_document("user-auth", DocumentType::Tasks)
                .unwrap()
                .as_deref(),
            Some(custom)
        );
    }

    #[test]
    fn test_unapproved_update_generates_nothing() {
        let (_tmp, repo, processor) = setup();
        let engine = WorkflowEngine::new(&repo, &processor, 1_000_000);
        let outcome = engine
            .record_document_update("user-auth", DocumentType::Requirements, REQUIREMENTS, false)
            .unwrap();
        assert_eq!(outcome.generated, None);
        assert_eq!(
            repo.read_document("user-auth", DocumentType::Design)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_invalid_content_with_approval_persists_nothing() {
        let (_tmp, repo, processor) = setup();
        let engine = WorkflowEngine::new(&repo, &processor, 1_000_000);

        let err = engine
            .record_document_update("user-auth", DocumentType::Requirements, "just an idea", true)
            .unwrap_err();
        assert!(matches!(err, SpecError::InvalidPhaseTransition { .. }));
        assert_eq!(
            repo.read_document("user-auth", DocumentType::Requirements)
                .unwrap(),
            None
        );
        assert_eq!(engine.current_phase("user-auth").unwrap(), Phase::Requirements);
    }

    #[test]
    fn test_write_ahead_of_phase_is_rejected() {
        let (_tmp, repo, processor) = setup();
        let engine = WorkflowEngine::new(&repo, &processor, 1_000_000);
        engine
            .record_document_update("user-auth", DocumentType::Requirements, REQUIREMENTS, false)
            .unwrap();

        let err = engine
            .record_document_update("user-auth", DocumentType::Design, DESIGN, false)
            .unwrap_err();
        match err {
            SpecError::MissingPrerequisiteDocument { prerequisite, .. } => {
                assert_eq!(prerequisite, DocumentType::Requirements)
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_revision_moves_back_and_clears_approvals() {
        let (_tmp, repo, processor) = setup();
        let engine = WorkflowEngine::new(&repo, &processor, 1_000_000);
        engine
            .record_document_update("user-auth", DocumentType::Requirements, REQUIREMENTS, true)
            .unwrap();
        engine
            .record_document_update("user-auth", DocumentType::Design, DESIGN, true)
            .unwrap();
        assert_eq!(engine.current_phase("user-auth").unwrap(), Phase::Tasks);

        let revised = format!("{}2. WHEN a session expires THEN the system SHALL log out\n", REQUIREMENTS);
        let outcome = engine
            .record_document_update("user-auth", DocumentType::Requirements, &revised, true)
            .unwrap();
        assert_eq!(outcome.phase, Phase::Requirements);
        assert!(!outcome.approved);
        assert_eq!(
            outcome.cleared_approvals,
            vec![DocumentType::Requirements, DocumentType::Design]
        );
        assert!(outcome
            .findings
            .iter()
            .any(|f| f.category == FindingCategory::IgnoredApproval));

        // Later documents are kept
        assert!(repo
            .read_document("user-auth", DocumentType::Design)
            .unwrap()
            .is_some());

        assert_eq!(engine.approve("user-auth").unwrap(), Phase::Design);
    }

    #[test]
    fn test_rewriting_identical_content_is_not_a_revision() {
        let (_tmp, repo, processor) = setup();
        let engine = WorkflowEngine::new(&repo, &processor, 1_000_000);
        engine
            .record_document_update("user-auth", DocumentType::Requirements, REQUIREMENTS, true)
            .unwrap();
        let outcome = engine
            .record_document_update("user-auth", DocumentType::Requirements, REQUIREMENTS, false)
            .unwrap();
        assert_eq!(outcome.phase, Phase::Design);
        assert!(outcome.cleared_approvals.is_empty());
    }

    #[test]
    fn test_full_workflow_and_progress_tracking() {
        let (_tmp, repo, processor) = setup();
        let engine = WorkflowEngine::new(&repo, &processor, 1_000_000);
        engine
            .record_document_update("user-auth", DocumentType::Requirements, REQUIREMENTS, true)
            .unwrap();
        engine
            .record_document_update("user-auth", DocumentType::Design, DESIGN, true)
            .unwrap();
        engine
            .record_document_update("user-auth", DocumentType::Tasks, TASKS, true)
            .unwrap();
        assert_eq!(engine.current_phase("user-auth").unwrap(), Phase::Complete);
        assert_eq!(engine.advance("user-auth").unwrap(), Phase::Complete);

        // Checking a box in a completed workflow does not reopen it
        let checked = "- [x] 1. Create session store\n  - _Requirements: 1.1_\n";
        let outcome = engine
            .record_document_update("user-auth", DocumentType::Tasks, checked, false)
            .unwrap();
        assert_eq!(outcome.phase, Phase::Complete);
        let spec = repo.load("user-auth").unwrap();
        assert!(!spec.is_stale(DocumentType::Tasks, &outcome.content));

        let outcome = engine
            .update_task_status("user-auth", "1", TaskStatus::NotStarted)
            .unwrap();
        assert_eq!(outcome.change.previous, TaskStatus::Completed);
        assert_eq!(engine.current_phase("user-auth").unwrap(), Phase::Complete);
    }

    #[test]
    fn test_advance_requires_approval() {
        let (_tmp, repo, processor) = setup();
        let engine = WorkflowEngine::new(&repo, &processor, 1_000_000);
        engine
            .record_document_update("user-auth", DocumentType::Requirements, REQUIREMENTS, false)
            .unwrap();

        let err = engine.advance("user-auth").unwrap_err();
        assert!(matches!(err, SpecError::InvalidPhaseTransition { .. }));
        assert_eq!(engine.current_phase("user-auth").unwrap(), Phase::Requirements);
    }

    #[test]
    fn test_document_size_limit() {
        let (_tmp, repo, processor) = setup();
        let engine = WorkflowEngine::new(&repo, &processor, 10);
        let err = engine
            .record_document_update("user-auth", DocumentType::Requirements, REQUIREMENTS, false)
            .unwrap_err();
        assert!(matches!(err, SpecError::DocumentTooLarge { limit: 10, .. }));
    }

    #[test]
    fn test_completed_parent_with_open_sub_task_rejected() {
        let (_tmp, repo, processor) = setup();
        let engine = WorkflowEngine::new(&repo, &processor, 1_000_000);
        engine
            .record_document_update("user-auth", DocumentType::Requirements, REQUIREMENTS, true)
            .unwrap();
        engine
            .record_document_update("user-auth", DocumentType::Design, DESIGN, true)
            .unwrap();

        let err = engine
            .record_document_update(
                "user-auth",
                DocumentType::Tasks,
                "- [x] 1. Parent\n  - [ ] 1.1 Child\n",
                false,
            )
            .unwrap_err();
        assert!(matches!(err, SpecError::TaskHierarchyViolation { .. }));
    }
}
