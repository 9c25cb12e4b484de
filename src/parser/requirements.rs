//! Acceptance-criteria extraction from requirements documents
//!
//! A requirement starts at a heading such as `### Requirement 2`; numbered
//! list items below it are its acceptance criteria, addressed as `2.1`,
//! `2.2`, ... Items written with an explicit dotted number (`2.3 WHEN ...`)
//! are recognised anywhere in the document.

use crate::models::ClauseRef;
use regex::Regex;
use std::sync::LazyLock;

static REQUIREMENT_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^#{1,6}\s*Requirement\s+(\d+)\b").expect("requirement heading pattern is valid")
});

static DOTTED_CRITERION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+]\s+)?(\d+)\.(\d+)[.:)]?\s+(.+?)\s*$")
        .expect("dotted criterion pattern is valid")
});

static NUMBERED_CRITERION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)[.)]\s+(.+?)\s*$").expect("numbered criterion pattern is valid")
});

/// A single acceptance criterion
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub reference: ClauseRef,
    pub text: String,
    /// Line of the criterion (1-indexed)
    pub line: usize,
}

/// All acceptance criteria of a requirements document, in document order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequirementCatalog {
    clauses: Vec<Clause>,
}

impl RequirementCatalog {
    pub fn parse(content: &str) -> Self {
        let mut clauses: Vec<Clause> = Vec::new();
        let mut current_requirement: Option<u32> = None;

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;

            if let Some(caps) = REQUIREMENT_HEADING.captures(line) {
                current_requirement = caps.get(1).and_then(|m| m.as_str().parse().ok());
                continue;
            }
            if line.trim_start().starts_with('#') {
                continue;
            }

            if let Some(caps) = DOTTED_CRITERION.captures(line) {
                let requirement = caps.get(1).and_then(|m| m.as_str().parse().ok());
                let criterion = caps.get(2).and_then(|m| m.as_str().parse().ok());
                if let (Some(requirement), Some(criterion)) = (requirement, criterion) {
                    push_unique(
                        &mut clauses,
                        Clause {
                            reference: ClauseRef::new(requirement, criterion),
                            text: caps[3].to_string(),
                            line: line_no,
                        },
                    );
                }
                continue;
            }

            if let (Some(requirement), Some(caps)) =
                (current_requirement, NUMBERED_CRITERION.captures(line))
            {
                if let Ok(criterion) = caps[1].parse::<u32>() {
                    push_unique(
                        &mut clauses,
                        Clause {
                            reference: ClauseRef::new(requirement, criterion),
                            text: caps[2].to_string(),
                            line: line_no,
                        },
                    );
                }
            }
        }

        Self { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn contains(&self, reference: &ClauseRef) -> bool {
        self.get(reference).is_some()
    }

    pub fn get(&self, reference: &ClauseRef) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.reference == *reference)
    }
}

/// First definition of a clause wins
fn push_unique(clauses: &mut Vec<Clause>, clause: Clause) {
    if !clauses.iter().any(|c| c.reference == clause.reference) {
        clauses.push(clause);
    }
}
