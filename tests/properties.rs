//! Property tests for canonical task formatting and phase progression

use proptest::prelude::*;
use specd::models::{ClauseRef, DocumentType, Phase, Task, TaskList, TaskStatus};
use specd::parser::{parse_tasks, RequirementCatalog};
use specd::services::{create_specification, CreateSpecInput};
use specd::tasks::{format, TaskListProcessor};
use specd::{SpecdConfig, Workspace};
use tempfile::TempDir;

fn words() -> impl Strategy<Value = String> {
    "[a-z]{1,8}( [a-z]{1,8}){0,3}"
}

fn status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![Just(TaskStatus::NotStarted), Just(TaskStatus::Completed)]
}

/// Distinct references in the order they were drawn
fn clause_refs() -> impl Strategy<Value = Vec<ClauseRef>> {
    prop::collection::vec((1u32..5, 1u32..5), 0..4).prop_map(|pairs| {
        let mut refs: Vec<ClauseRef> = Vec::new();
        for (requirement, criterion) in pairs {
            let reference = ClauseRef::new(requirement, criterion);
            if !refs.contains(&reference) {
                refs.push(reference);
            }
        }
        refs
    })
}

type Entry = (String, TaskStatus, Vec<String>, Vec<ClauseRef>);

fn entry() -> impl Strategy<Value = Entry> {
    (
        words(),
        status(),
        prop::collection::vec(words(), 0..3),
        clause_refs(),
    )
}

fn task(id: String, (description, status, details, requirements): Entry) -> Task {
    Task {
        id,
        description,
        status,
        details,
        requirements,
        parent: None,
        sub_tasks: Vec::new(),
        line: 0,
    }
}

fn task_list() -> impl Strategy<Value = TaskList> {
    prop::collection::vec((entry(), prop::collection::vec(entry(), 0..4)), 1..6).prop_map(
        |entries| {
            let tasks = entries
                .into_iter()
                .enumerate()
                .map(|(idx, (parent, subs))| {
                    let id = (idx + 1).to_string();
                    let mut parent = task(id.clone(), parent);
                    parent.sub_tasks = subs
                        .into_iter()
                        .enumerate()
                        .map(|(sub_idx, sub)| {
                            let mut sub = task(format!("{}.{}", id, sub_idx + 1), sub);
                            sub.parent = Some(id.clone());
                            sub
                        })
                        .collect();
                    parent
                })
                .collect();
            TaskList { tasks }
        },
    )
}

proptest! {
    #[test]
    fn canonical_document_round_trips(list in task_list()) {
        let rendered = format::render(&list);
        let parsed = parse_tasks(&rendered).unwrap();
        prop_assert!(parsed.prose.is_empty());
        let drawn: Vec<_> = list.iter().map(|t| t.requirements.clone()).collect();
        let read: Vec<_> = parsed.list.iter().map(|t| t.requirements.clone()).collect();
        prop_assert_eq!(read, drawn);
        prop_assert_eq!(format::render(&parsed.list), rendered);
    }

    #[test]
    fn canonicalize_is_idempotent(list in task_list()) {
        let processor = TaskListProcessor::from_config(&SpecdConfig::default().linking);
        let catalog = RequirementCatalog::default();

        let once = processor.canonicalize(&format::render(&list), &catalog).unwrap();
        let twice = processor.canonicalize(&once.content, &catalog).unwrap();
        prop_assert_eq!(&twice.content, &once.content);
    }
}

fn valid_document(document: DocumentType) -> &'static str {
    match document {
        DocumentType::Requirements => {
            "# Requirements\n\n### Requirement 1\n\n1. WHEN a user logs in THEN the system SHALL start a session\n"
        }
        DocumentType::Design => "# Design\n\n## Overview\n",
        DocumentType::Tasks => "- [ ] 1. Build login form\n  - _Requirements: 1.1_\n",
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn advance_never_skips_a_phase(steps in 0usize..7) {
        let temp_dir = TempDir::new().unwrap();
        let workspace = Workspace::with_config(temp_dir.path(), SpecdConfig::default());
        create_specification(
            &workspace,
            CreateSpecInput {
                feature_name: "user-auth".to_string(),
                initial_idea: "login system".to_string(),
            },
        )
        .unwrap();

        let engine = workspace.engine();
        for _ in 0..steps {
            let phase = engine.current_phase("user-auth").unwrap();
            if let Some(document) = phase.document() {
                engine
                    .record_document_update("user-auth", document, valid_document(document), false)
                    .unwrap();
            }
            engine.approve("user-auth").unwrap();
        }

        let expected = Phase::from_ordinal(steps.min(Phase::Complete.ordinal()));
        prop_assert_eq!(engine.current_phase("user-auth").unwrap(), expected);
    }
}
