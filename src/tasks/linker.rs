//! Requirement linking strategies
//!
//! A linker proposes requirement clauses for a task that carries no
//! `_Requirements:_` annotation. Linking is heuristic, so the strategy is a
//! trait object chosen by configuration, and a linker that is not confident
//! must return nothing rather than a guess.

use crate::config::LinkingConfig;
use crate::models::ClauseRef;
use crate::parser::requirements::RequirementCatalog;
use std::collections::BTreeSet;

/// Strategy that maps task text to requirement clauses
pub trait RequirementLinker: Send + Sync {
    /// Short name used in logs and findings
    fn name(&self) -> &'static str;

    /// Clauses that confidently match `task_text`, best first
    fn link(&self, task_text: &str, catalog: &RequirementCatalog) -> Vec<ClauseRef>;
}

/// Words carrying no topic: articles, modals, EARS keywords and generic verbs
const STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "with", "are", "was", "were", "been", "have", "has", "had",
    "does", "did", "will", "would", "could", "should", "may", "might", "can", "must", "shall",
    "this", "that", "these", "those", "from", "into", "onto", "each", "all", "any", "its",
    "when", "then", "while", "where", "which", "who", "what", "not", "than", "system", "able",
    "via", "per", "implement", "create", "build", "develop", "add", "modify", "update", "fix",
    "test", "validate", "ensure", "support", "write", "make", "use", "set", "new",
];

/// Token-overlap linker
///
/// A clause's score is the share of the task's distinct terms that also
/// appear in the clause. A clause is linked when at least
/// `min_shared_terms` terms are shared and the score reaches `min_score`;
/// at most `max_links` clauses are returned, ordered by score and then by
/// document order.
#[derive(Debug, Clone)]
pub struct KeywordOverlapLinker {
    pub min_score: f64,
    pub min_shared_terms: usize,
    pub max_links: usize,
}

impl Default for KeywordOverlapLinker {
    fn default() -> Self {
        Self::from(&LinkingConfig::default())
    }
}

impl From<&LinkingConfig> for KeywordOverlapLinker {
    fn from(config: &LinkingConfig) -> Self {
        Self {
            min_score: config.min_score,
            min_shared_terms: config.min_shared_terms,
            max_links: config.max_links,
        }
    }
}

impl RequirementLinker for KeywordOverlapLinker {
    fn name(&self) -> &'static str {
        "keyword-overlap"
    }

    fn link(&self, task_text: &str, catalog: &RequirementCatalog) -> Vec<ClauseRef> {
        let task_terms = terms(task_text);
        if task_terms.is_empty() || self.max_links == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f64, usize, ClauseRef)> = catalog
            .clauses()
            .iter()
            .enumerate()
            .filter_map(|(position, clause)| {
                let clause_terms = terms(&clause.text);
                let shared = task_terms.intersection(&clause_terms).count();
                let score = shared as f64 / task_terms.len() as f64;
                (shared >= self.min_shared_terms && score >= self.min_score)
                    .then_some((score, position, clause.reference))
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(self.max_links)
            .map(|(_, _, reference)| reference)
            .collect()
    }
}

/// Linker that never links; used when auto-linking is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLinker;

impl RequirementLinker for NoLinker {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn link(&self, _task_text: &str, _catalog: &RequirementCatalog) -> Vec<ClauseRef> {
        Vec::new()
    }
}

/// Build the linker selected by configuration
pub fn linker_for(config: &LinkingConfig) -> Box<dyn RequirementLinker> {
    if config.enabled {
        Box::new(KeywordOverlapLinker::from(config))
    } else {
        Box::new(NoLinker)
    }
}

/// Distinct normalized terms of a text
fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= 3 && w.starts_with(|c: char| c.is_alphabetic()))
        .map(normalize_term)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Fold simple plurals so "sessions" matches "session"
fn normalize_term(word: String) -> String {
    if word.len() > 4 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIREMENTS: &str = r#"### Requirement 1

#### Acceptance Criteria

1. WHEN a user submits valid credentials THEN the system SHALL create a login session
2. WHEN a session expires THEN the system SHALL redirect to the login page

### Requirement 2

#### Acceptance Criteria

1. WHEN an administrator exports audit logs THEN the system SHALL produce a CSV file
"#;

    #[test]
    fn test_links_confident_match() {
        let catalog = RequirementCatalog::parse(REQUIREMENTS);
        let linker = KeywordOverlapLinker::default();
        let refs = linker.link("Implement login session handling for valid credentials", &catalog);
        assert_eq!(refs.first(), Some(&ClauseRef::new(1, 1)));
    }

    #[test]
    fn test_no_match_returns_nothing() {
        let catalog = RequirementCatalog::parse(REQUIREMENTS);
        let linker = KeywordOverlapLinker::default();
        assert!(linker.link("Build API", &catalog).is_empty());
        assert!(linker.link("Write tests", &catalog).is_empty());
    }

    #[test]
    fn test_single_shared_term_is_not_enough() {
        let catalog = RequirementCatalog::parse(REQUIREMENTS);
        let linker = KeywordOverlapLinker::default();
        // "csv" is shared but a single term does not make a confident match
        assert!(linker.link("Add CSV", &catalog).is_empty());
    }

    #[test]
    fn test_max_links() {
        let catalog = RequirementCatalog::parse(REQUIREMENTS);
        let linker = KeywordOverlapLinker {
            min_score: 0.1,
            min_shared_terms: 1,
            max_links: 1,
        };
        assert_eq!(linker.link("login session", &catalog).len(), 1);
    }

    #[test]
    fn test_terms_normalization() {
        let t = terms("The Sessions SHALL expire; users log in");
        assert!(t.contains("session"));
        assert!(t.contains("expire"));
        assert!(t.contains("user"));
        assert!(!t.contains("the"));
        assert!(!t.contains("shall"));
        assert!(!t.contains("in"));
    }

    #[test]
    fn test_disabled_linker() {
        let catalog = RequirementCatalog::parse(REQUIREMENTS);
        let config = LinkingConfig {
            enabled: false,
            ..LinkingConfig::default()
        };
        assert!(linker_for(&config)
            .link("login session valid credentials", &catalog)
            .is_empty());
    }
}
