use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow phase of a specification.
///
/// Phases are ordered; forward movement is one step at a time and
/// backward movement happens only through document revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Requirements,
    Design,
    Tasks,
    Complete,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Requirements,
        Phase::Design,
        Phase::Tasks,
        Phase::Complete,
    ];

    /// Position in the workflow, starting at 0
    pub fn ordinal(self) -> usize {
        match self {
            Phase::Requirements => 0,
            Phase::Design => 1,
            Phase::Tasks => 2,
            Phase::Complete => 3,
        }
    }

    /// Phase at the given ordinal, saturating at `Complete`
    pub fn from_ordinal(ordinal: usize) -> Phase {
        Phase::ALL[ordinal.min(Phase::ALL.len() - 1)]
    }

    /// The phase that follows this one, if any
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Requirements => Some(Phase::Design),
            Phase::Design => Some(Phase::Tasks),
            Phase::Tasks => Some(Phase::Complete),
            Phase::Complete => None,
        }
    }

    /// The document that is authored and approved during this phase
    pub fn document(self) -> Option<DocumentType> {
        match self {
            Phase::Requirements => Some(DocumentType::Requirements),
            Phase::Design => Some(DocumentType::Design),
            Phase::Tasks => Some(DocumentType::Tasks),
            Phase::Complete => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Requirements => "REQUIREMENTS",
            Phase::Design => "DESIGN",
            Phase::Tasks => "TASKS",
            Phase::Complete => "COMPLETE",
        }
    }

    /// Get emoji for phase
    pub fn emoji(self) -> &'static str {
        match self {
            Phase::Requirements => "📝",
            Phase::Design => "📐",
            Phase::Tasks => "📋",
            Phase::Complete => "✅",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the three documents owned by a specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Requirements,
    Design,
    Tasks,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        DocumentType::Requirements,
        DocumentType::Design,
        DocumentType::Tasks,
    ];

    /// Phase in which this document is written and approved
    pub fn phase(self) -> Phase {
        match self {
            DocumentType::Requirements => Phase::Requirements,
            DocumentType::Design => Phase::Design,
            DocumentType::Tasks => Phase::Tasks,
        }
    }

    /// Documents that must exist before this one may be written
    pub fn prerequisites(self) -> &'static [DocumentType] {
        match self {
            DocumentType::Requirements => &[],
            DocumentType::Design => &[DocumentType::Requirements],
            DocumentType::Tasks => &[DocumentType::Requirements, DocumentType::Design],
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            DocumentType::Requirements => "requirements.md",
            DocumentType::Design => "design.md",
            DocumentType::Tasks => "tasks.md",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Requirements => "requirements",
            DocumentType::Design => "design",
            DocumentType::Tasks => "tasks",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "requirements" | "requirements.md" => Ok(DocumentType::Requirements),
            "design" | "design.md" => Ok(DocumentType::Design),
            "tasks" | "tasks.md" => Ok(DocumentType::Tasks),
            other => Err(format!(
                "unknown document type '{}' (expected requirements, design or tasks)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        assert!(Phase::Requirements < Phase::Design);
        assert!(Phase::Design < Phase::Tasks);
        assert!(Phase::Tasks < Phase::Complete);
        assert_eq!(Phase::Tasks.next(), Some(Phase::Complete));
        assert_eq!(Phase::Complete.next(), None);
    }

    #[test]
    fn test_from_ordinal_saturates() {
        assert_eq!(Phase::from_ordinal(0), Phase::Requirements);
        assert_eq!(Phase::from_ordinal(3), Phase::Complete);
        assert_eq!(Phase::from_ordinal(42), Phase::Complete);
    }

    #[test]
    fn test_document_type_parse() {
        assert_eq!("Design".parse::<DocumentType>(), Ok(DocumentType::Design));
        assert_eq!("tasks.md".parse::<DocumentType>(), Ok(DocumentType::Tasks));
        assert!("proposal".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_prerequisites() {
        assert!(DocumentType::Requirements.prerequisites().is_empty());
        assert_eq!(
            DocumentType::Tasks.prerequisites(),
            &[DocumentType::Requirements, DocumentType::Design]
        );
    }

    #[test]
    fn test_phase_serializes_uppercase() {
        let yaml = serde_yaml::to_string(&Phase::Design).unwrap();
        assert_eq!(yaml.trim(), "DESIGN");
    }
}
