use crate::error::SpecError;
use serde::{Deserialize, Serialize};

/// Severity level for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// High severity - blocks phase advancement
    High,
    /// Medium severity - warning, should be fixed
    Medium,
    /// Low severity - informational
    Low,
}

impl Severity {
    /// Get display symbol for severity
    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::High => "🔴",
            Severity::Medium => "🟡",
            Severity::Low => "🔵",
        }
    }

    /// Get display name for severity
    pub fn name(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

/// Category of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    /// Document has no content
    EmptyContent,
    /// Required structure is missing or malformed
    InvalidStructure,
    /// Acceptance criterion does not follow EARS phrasing
    MissingShall,
    /// Prose outside the task grammar, removed from the tasks document
    RelocatedProse,
    /// Leaf task without requirement references
    UnlinkedTask,
    /// Requirement reference was synthesized from keyword matching
    LinkedTask,
    /// Requirement reference that is not of the form N.M
    MalformedReference,
    /// Requirement reference to a clause that does not exist
    DanglingReference,
    /// Parent task was reopened because a sub-task was reopened
    ReopenedParent,
    /// Approval accompanied a document that is not the current phase's
    IgnoredApproval,
}

impl FindingCategory {
    /// Get display name for category
    pub fn name(&self) -> &'static str {
        match self {
            FindingCategory::EmptyContent => "Empty Content",
            FindingCategory::InvalidStructure => "Invalid Structure",
            FindingCategory::MissingShall => "Missing SHALL",
            FindingCategory::RelocatedProse => "Relocated Prose",
            FindingCategory::UnlinkedTask => "Unlinked Task",
            FindingCategory::LinkedTask => "Linked Task",
            FindingCategory::MalformedReference => "Malformed Reference",
            FindingCategory::DanglingReference => "Dangling Reference",
            FindingCategory::ReopenedParent => "Reopened Parent",
            FindingCategory::IgnoredApproval => "Ignored Approval",
        }
    }
}

/// Document a relocated block most likely belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Requirements,
    Design,
    Unknown,
}

impl Destination {
    pub fn describe(&self) -> &'static str {
        match self {
            Destination::Requirements => "the requirements document",
            Destination::Design => "the design document",
            Destination::Unknown => "the requirements or design document",
        }
    }
}

/// A problem or notice found while processing a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub message: String,
    /// Line number (1-indexed) if applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub severity: Severity,
    pub category: FindingCategory,
    /// Text the finding is about (relocated prose, offending reference)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_destination: Option<Destination>,
}

impl Finding {
    pub fn new(
        message: impl Into<String>,
        line: Option<usize>,
        severity: Severity,
        category: FindingCategory,
    ) -> Self {
        Self {
            message: message.into(),
            line,
            severity,
            category,
            content: None,
            suggested_destination: None,
        }
    }

    /// Blocking finding
    pub fn error(message: impl Into<String>, category: FindingCategory) -> Self {
        Self::new(message, None, Severity::High, category)
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.suggested_destination = Some(destination);
        self
    }

    /// Warning-level finding for a recoverable error
    pub fn warning(error: &SpecError) -> Self {
        let category = match error {
            SpecError::DanglingRequirementReference { .. } => FindingCategory::DanglingReference,
            _ => FindingCategory::InvalidStructure,
        };
        let message = match error.hint() {
            Some(hint) => format!("{} ({})", error, hint),
            None => error.to_string(),
        };
        Self::new(message, None, Severity::Medium, category)
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::High
    }

    /// Format finding for display
    pub fn format(&self) -> String {
        match self.line {
            Some(line) => format!(
                "{} [{}] {}, line {} - {}",
                self.severity.symbol(),
                self.severity.name(),
                self.category.name(),
                line,
                self.message
            ),
            None => format!(
                "{} [{}] {} - {}",
                self.severity.symbol(),
                self.severity.name(),
                self.category.name(),
                self.message
            ),
        }
    }
}

/// Result of structural validation of a document
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    /// Check if validation passed (no high-severity findings)
    pub fn is_valid(&self) -> bool {
        !self.findings.iter().any(Finding::is_blocking)
    }

    /// Messages of blocking findings, joined for error reporting
    pub fn blocking_summary(&self) -> String {
        self.findings
            .iter()
            .filter(|f| f.is_blocking())
            .map(|f| match f.line {
                Some(line) => format!("line {}: {}", line, f.message),
                None => f.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_validity() {
        let report = ValidationReport::new(vec![Finding::new(
            "relocate",
            Some(3),
            Severity::Low,
            FindingCategory::RelocatedProse,
        )]);
        assert!(report.is_valid());

        let report = ValidationReport::new(vec![Finding::error(
            "document is empty",
            FindingCategory::EmptyContent,
        )]);
        assert!(!report.is_valid());
        assert_eq!(report.blocking_summary(), "document is empty");
    }

    #[test]
    fn test_format_with_line() {
        let finding = Finding::new("bad", Some(7), Severity::Medium, FindingCategory::MalformedReference);
        assert_eq!(finding.format(), "🟡 [MEDIUM] Malformed Reference, line 7 - bad");
    }

    #[test]
    fn test_format_without_line() {
        let finding = Finding::new(
            "approval ignored",
            None,
            Severity::Low,
            FindingCategory::IgnoredApproval,
        );
        assert!(finding.format().ends_with("[LOW] Ignored Approval - approval ignored"));
    }

    #[test]
    fn test_warning_from_dangling_reference() {
        let error = SpecError::DanglingRequirementReference {
            task: "2.1".to_string(),
            reference: "9.9".to_string(),
        };
        let finding = Finding::warning(&error);
        assert_eq!(finding.category, FindingCategory::DanglingReference);
        assert_eq!(finding.severity, Severity::Medium);
        assert!(finding.message.contains("9.9"));
    }
}
