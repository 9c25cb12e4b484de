use super::{DocumentType, Phase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Maximum length of a feature name
pub const MAX_FEATURE_NAME_LEN: usize = 50;

/// Metadata of a feature specification, persisted as `spec.yaml`
///
/// The current phase lives here and is loaded and saved on every call;
/// nothing about a specification is cached between operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Specification {
    /// Unique kebab-case identifier (e.g., "user-auth")
    pub feature_name: String,

    /// Current workflow phase
    pub phase: Phase,

    /// Idea the specification was created from
    #[serde(default)]
    pub initial_idea: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Approval records keyed by document
    #[serde(default)]
    pub approvals: BTreeMap<DocumentType, Approval>,
}

/// An explicit approval of a document's content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Approval {
    pub approved_at: DateTime<Utc>,
    /// SHA-256 of the content that was approved
    pub checksum: String,
}

impl Specification {
    pub fn new(feature_name: impl Into<String>, initial_idea: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            feature_name: feature_name.into(),
            phase: Phase::Requirements,
            initial_idea: initial_idea.into(),
            created_at: now,
            updated_at: now,
            approvals: BTreeMap::new(),
        }
    }

    pub fn is_approved(&self, document: DocumentType) -> bool {
        self.approvals.contains_key(&document)
    }

    /// Record approval of `content` for `document`
    pub fn approve(&mut self, document: DocumentType, content: &str) {
        self.approvals.insert(
            document,
            Approval {
                approved_at: Utc::now(),
                checksum: content_checksum(content),
            },
        );
    }

    /// Clear approvals of `from` and every later document
    ///
    /// Returns the documents whose approval was cleared.
    pub fn clear_approvals_from(&mut self, from: DocumentType) -> Vec<DocumentType> {
        let cleared: Vec<DocumentType> = self
            .approvals
            .keys()
            .copied()
            .filter(|doc| *doc >= from)
            .collect();
        for doc in &cleared {
            self.approvals.remove(doc);
        }
        cleared
    }

    /// True when `content` no longer matches what was approved for `document`
    pub fn is_stale(&self, document: DocumentType, content: &str) -> bool {
        self.approvals
            .get(&document)
            .map(|approval| approval.checksum != content_checksum(content))
            .unwrap_or(false)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Hex-encoded SHA-256 of document content
pub fn content_checksum(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Check that a feature name is kebab-case and short enough
///
/// Returns the reason the name is rejected.
pub fn check_feature_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("feature name must not be empty".to_string());
    }
    if name.len() > MAX_FEATURE_NAME_LEN {
        return Err(format!(
            "feature name must be at most {} characters",
            MAX_FEATURE_NAME_LEN
        ));
    }
    if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err("feature name must start with a lowercase letter".to_string());
    }
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid_chars || name.ends_with('-') || name.contains("--") {
        return Err(
            "feature name must be kebab-case (lowercase letters, digits, single hyphens)"
                .to_string(),
        );
    }
    Ok(())
}
