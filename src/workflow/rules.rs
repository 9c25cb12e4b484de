//! Structural rules a document must satisfy before its phase can be left

use crate::models::{DocumentType, Finding, FindingCategory, Severity, ValidationReport};
use crate::parser::requirements::RequirementCatalog;
use crate::parser::tasks::parse_tasks;
use crate::error::SpecError;
use pulldown_cmark::{Event, Options, Parser, Tag};

/// Phase-specific validation of one document type
pub trait DocumentRules {
    fn document(&self) -> DocumentType;

    /// Findings about `content`; any high-severity finding blocks approval
    fn check(&self, content: &str) -> ValidationReport {
        if content.trim().is_empty() {
            return ValidationReport::new(vec![Finding::error(
                format!("the {} document is empty", self.document()),
                FindingCategory::EmptyContent,
            )]);
        }
        ValidationReport::new(self.check_structure(content))
    }

    /// Checks applied to non-empty content
    fn check_structure(&self, content: &str) -> Vec<Finding>;
}

pub struct RequirementsRules;
pub struct DesignRules;
pub struct TasksRules;

/// Rules for a document type
pub fn rules_for(document: DocumentType) -> &'static dyn DocumentRules {
    match document {
        DocumentType::Requirements => &RequirementsRules,
        DocumentType::Design => &DesignRules,
        DocumentType::Tasks => &TasksRules,
    }
}

impl DocumentRules for RequirementsRules {
    fn document(&self) -> DocumentType {
        DocumentType::Requirements
    }

    fn check_structure(&self, content: &str) -> Vec<Finding> {
        let catalog = RequirementCatalog::parse(content);
        if catalog.is_empty() {
            return vec![Finding::error(
                "no acceptance criteria found; number them under '### Requirement N' headings",
                FindingCategory::InvalidStructure,
            )];
        }

        catalog
            .clauses()
            .iter()
            .filter(|clause| !clause.text.to_ascii_uppercase().contains("SHALL"))
            .map(|clause| {
                Finding::new(
                    format!(
                        "acceptance criterion {} does not state what the system SHALL do",
                        clause.reference
                    ),
                    Some(clause.line),
                    Severity::High,
                    FindingCategory::MissingShall,
                )
                .with_content(clause.text.clone())
            })
            .collect()
    }
}

impl DocumentRules for DesignRules {
    fn document(&self) -> DocumentType {
        DocumentType::Design
    }

    fn check_structure(&self, content: &str) -> Vec<Finding> {
        let has_heading = Parser::new_ext(content, Options::all())
            .any(|event| matches!(event, Event::Start(Tag::Heading { .. })));
        if has_heading {
            Vec::new()
        } else {
            vec![Finding::error(
                "the design document has no section headings",
                FindingCategory::InvalidStructure,
            )]
        }
    }
}

impl DocumentRules for TasksRules {
    fn document(&self) -> DocumentType {
        DocumentType::Tasks
    }

    fn check_structure(&self, content: &str) -> Vec<Finding> {
        match parse_tasks(content) {
            Ok(parsed) if parsed.list.is_empty() => vec![Finding::error(
                "the tasks document contains no tasks",
                FindingCategory::InvalidStructure,
            )],
            Ok(_) => Vec::new(),
            Err(SpecError::Validation { message, line }) => vec![Finding::new(
                message,
                line,
                Severity::High,
                FindingCategory::InvalidStructure,
            )],
            Err(other) => vec![Finding::error(
                other.to_string(),
                FindingCategory::InvalidStructure,
            )],
        }
    }
}
