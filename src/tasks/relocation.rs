//! Destination guess for prose removed from a tasks document

use crate::models::Destination;

const REQUIREMENT_KEYWORDS: &[&str] = &[
    "shall",
    "must",
    "should",
    "user story",
    "acceptance criteria",
    "as a",
    "i want",
    "so that",
    "when",
    "then",
];

const DESIGN_KEYWORDS: &[&str] = &[
    "architecture",
    "component",
    "interface",
    "model",
    "pattern",
    "approach",
    "strategy",
    "design",
    "structure",
    "framework",
    "diagram",
    "data flow",
];

/// Suggest the document a block of prose belongs to
pub fn classify(text: &str) -> Destination {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let normalized = words.join(" ");

    let hits = |keywords: &[&str]| {
        keywords
            .iter()
            .filter(|k| contains_phrase(&normalized, k))
            .count()
    };

    let requirement = hits(REQUIREMENT_KEYWORDS);
    let design = hits(DESIGN_KEYWORDS);
    match (requirement, design) {
        (0, 0) => Destination::Unknown,
        (r, d) if r >= d => Destination::Requirements,
        _ => Destination::Design,
    }
}

/// Word-boundary phrase match on space-normalized text
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let padded = format!(" {} ", haystack);
    padded.contains(&format!(" {} ", phrase))
}
