//! Line grammar of tasks documents
//!
//! Every line of a tasks document is classified into exactly one token:
//!
//! ```text
//! checkbox    := indent bullet "[" mark "]" identifier? description
//! identifier  := digits ("." digits)* "."?
//! annotation  := indent (bullet)? "_Requirements:" refs "_"
//! bullet      := indent ("-" | "*" | "+") text
//! heading     := "#"{1,6} text
//! text        := anything else
//! ```
//!
//! Marks `x`/`X` mean completed; a blank, `-`, `~` or missing mark means
//! not-started. Structure (which task a line belongs to) is decided by the
//! parser from indentation, not here.

use regex::Regex;
use std::sync::LazyLock;

static CHECKBOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)[-*+]\s*\[([ xX~-]?)\]\s*(.*?)\s*$").expect("checkbox pattern is valid")
});

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*)\.?(?:\s+(.*))?$").expect("identifier pattern is valid")
});

static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\s*)(?:[-*+]\s+)?_Requirements:\s*(.*?)\s*_\s*$")
        .expect("annotation pattern is valid")
});

static INLINE_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*_Requirements:\s*([^_]*?)\s*_").expect("inline annotation pattern is valid")
});

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)[-*+]\s+(.*?)\s*$").expect("bullet pattern is valid"));

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*$").expect("heading pattern is valid"));

/// Classified line of a tasks document
#[derive(Debug, Clone, PartialEq)]
pub enum LineToken<'a> {
    Blank,
    Heading {
        level: usize,
        text: &'a str,
    },
    Checkbox {
        indent: usize,
        completed: bool,
        identifier: Option<&'a str>,
        description: &'a str,
    },
    Annotation {
        indent: usize,
        refs: &'a str,
    },
    Bullet {
        indent: usize,
        text: &'a str,
    },
    Text {
        indent: usize,
        text: &'a str,
    },
}

/// Classify a single line
pub fn tokenize_line(line: &str) -> LineToken<'_> {
    if line.trim().is_empty() {
        return LineToken::Blank;
    }

    if let Some(caps) = HEADING.captures(line) {
        let level = caps.get(1).map_or(1, |m| m.as_str().len());
        let text = caps.get(2).map_or("", |m| m.as_str());
        return LineToken::Heading { level, text };
    }

    if let Some(caps) = CHECKBOX.captures(line) {
        let indent = indent_width(caps.get(1).map_or("", |m| m.as_str()));
        let completed = matches!(caps.get(2).map(|m| m.as_str()), Some("x") | Some("X"));
        let rest = caps.get(3).map_or("", |m| m.as_str());
        let (identifier, description) = split_identifier(rest);
        return LineToken::Checkbox {
            indent,
            completed,
            identifier,
            description,
        };
    }

    if let Some(caps) = ANNOTATION.captures(line) {
        let indent = indent_width(caps.get(1).map_or("", |m| m.as_str()));
        let refs = caps.get(2).map_or("", |m| m.as_str());
        return LineToken::Annotation { indent, refs };
    }

    if let Some(caps) = BULLET.captures(line) {
        let indent = indent_width(caps.get(1).map_or("", |m| m.as_str()));
        let text = caps.get(2).map_or("", |m| m.as_str());
        return LineToken::Bullet { indent, text };
    }

    let trimmed = line.trim_start();
    LineToken::Text {
        indent: indent_width(&line[..line.len() - trimmed.len()]),
        text: trimmed.trim_end(),
    }
}

/// Split "2.1 Create models" into identifier and description
fn split_identifier(rest: &str) -> (Option<&str>, &str) {
    match IDENTIFIER.captures(rest) {
        Some(caps) => {
            let identifier = caps.get(1).map(|m| m.as_str());
            let description = caps.get(2).map_or("", |m| m.as_str().trim());
            (identifier, description)
        }
        None => (None, rest),
    }
}

/// Lift an inline `_Requirements: ..._` out of a description
///
/// Returns the description without the annotation and the raw reference list.
pub fn split_inline_annotation(description: &str) -> (String, Option<String>) {
    match INLINE_ANNOTATION.captures(description) {
        Some(caps) => {
            let refs = caps.get(1).map(|m| m.as_str().to_string());
            let stripped = INLINE_ANNOTATION.replace(description, "");
            (stripped.trim().to_string(), refs)
        }
        None => (description.to_string(), None),
    }
}

/// Width of leading whitespace, tabs counting as four columns
pub fn indent_width(prefix: &str) -> usize {
    prefix
        .chars()
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}
