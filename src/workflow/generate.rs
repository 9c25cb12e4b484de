//! Starter documents for each phase
//!
//! A new specification gets a requirements document built from its initial
//! idea. Entering DESIGN or TASKS without a document of that phase seeds one
//! derived from the documents already approved. Every starter passes the
//! rules of its document type, so it can be approved as-is or edited first.

use crate::models::{ClauseRef, Task, TaskList, TaskStatus};
use crate::parser::requirements::RequirementCatalog;
use crate::tasks::format;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static USER_STORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\*\*User Story:?\*\*:?\s*(.+?)\s*$").expect("user story pattern is valid")
});

static COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+]\s+)?\*\*([^*]+?)\*\*:?\s*(.*?)\s*$").expect("component pattern is valid")
});

const MAX_COMPONENT_TASKS: usize = 5;

/// Initial requirements document for a new specification
pub fn generate_requirements(feature_name: &str, initial_idea: &str) -> String {
    let title = title_case(feature_name);

    format!(
        r#"# Requirements Document

## Introduction

{title}: {idea}

## Requirements

### Requirement 1

**User Story:** As a user, I want {idea_lower}, so that I can achieve my goals efficiently

#### Acceptance Criteria

1. WHEN a user requests {title_lower} THEN the system SHALL provide the requested functionality
2. WHEN a user interacts with {title_lower} THEN the system SHALL respond within acceptable time limits
3. IF a user provides invalid input THEN the system SHALL provide clear error messages
"#,
        title = title,
        idea = initial_idea,
        idea_lower = lowercase_first(initial_idea),
        title_lower = title.to_lowercase(),
    )
}

/// Design skeleton covering every requirement of `requirements`
pub fn generate_design(feature_name: &str, requirements: &str) -> String {
    let title = title_case(feature_name);
    let catalog = RequirementCatalog::parse(requirements);
    let grouped = group_by_requirement(&catalog);
    let stories: Vec<&str> = requirements
        .lines()
        .filter_map(|line| USER_STORY.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    let mut out = String::new();
    out.push_str("# Design Document\n\n## Overview\n\n");
    out.push_str(&format!(
        "{} addresses {} requirement(s) with {} acceptance criteria.\n",
        title,
        grouped.len(),
        catalog.clauses().len()
    ));
    if !stories.is_empty() {
        out.push('\n');
        for story in &stories {
            out.push_str(&format!("- {}\n", story));
        }
    }

    out.push_str("\n## Architecture\n\n");
    out.push_str(&format!(
        "The {} service owns the feature's behaviour and delegates persistence to the {} store.\n",
        title, title
    ));

    out.push_str("\n## Components and Interfaces\n\n");
    out.push_str(&format!(
        "- **{} Service**: entry point handling the requests described in requirements.md\n",
        title
    ));
    out.push_str(&format!(
        "- **{} Store**: reads and writes the state the service depends on\n",
        title
    ));

    out.push_str("\n### Requirement Coverage\n\n");
    for (requirement, refs) in &grouped {
        let listed: Vec<String> = refs.iter().map(|r| r.to_string()).collect();
        out.push_str(&format!(
            "- Requirement {}: criteria {}\n",
            requirement,
            listed.join(", ")
        ));
    }

    out.push_str("\n## Data Models\n\nDescribe the entities and their fields.\n");
    out.push_str("\n## Error Handling\n\nEvery rejected input produces a clear error message.\n");
    out.push_str("\n## Testing Strategy\n\nEach acceptance criterion gets at least one test.\n");
    out
}

/// Canonical implementation plan derived from the requirements and design
///
/// Requirement references are taken from the requirements document only, so
/// the plan never points at a criterion that does not exist.
pub fn generate_tasks(feature_name: &str, requirements: &str, design: &str) -> String {
    let title = title_case(feature_name);
    let catalog = RequirementCatalog::parse(requirements);
    let mut tasks = Vec::new();

    tasks.push(task(
        tasks.len() + 1,
        format!("Set up project structure for {}", title),
        vec!["Create the module layout and shared interfaces".to_string()],
    ));

    for (name, summary) in design_components(design)
        .into_iter()
        .take(MAX_COMPONENT_TASKS)
    {
        let details = if summary.is_empty() { Vec::new() } else { vec![summary] };
        tasks.push(task(tasks.len() + 1, format!("Implement {}", name), details));
    }

    for (requirement, refs) in group_by_requirement(&catalog) {
        let mut parent = task(
            tasks.len() + 1,
            format!("Satisfy Requirement {}", requirement),
            Vec::new(),
        );
        for (idx, reference) in refs.iter().enumerate() {
            let Some(clause) = catalog.get(reference) else {
                continue;
            };
            let mut sub = task(0, clause.text.clone(), Vec::new());
            sub.id = format!("{}.{}", parent.id, idx + 1);
            sub.parent = Some(parent.id.clone());
            sub.requirements = vec![*reference];
            parent.sub_tasks.push(sub);
        }
        tasks.push(parent);
    }

    tasks.push(task(
        tasks.len() + 1,
        format!("Write tests for {}", title),
        vec!["Cover every acceptance criterion in requirements.md".to_string()],
    ));

    format::render(&TaskList { tasks })
}

/// `**Name**: summary` entries of the design's components section
fn design_components(design: &str) -> Vec<(String, String)> {
    let mut in_section = false;
    let mut components = Vec::new();
    for line in design.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("## ") {
            in_section = trimmed.to_ascii_lowercase().contains("component");
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some(caps) = COMPONENT.captures(line) {
            let name = caps[1].trim().trim_end_matches(':').to_string();
            if !name.is_empty() && !components.iter().any(|(n, _)| *n == name) {
                components.push((name, caps[2].to_string()));
            }
        }
    }
    components
}

fn group_by_requirement(catalog: &RequirementCatalog) -> BTreeMap<u32, Vec<ClauseRef>> {
    let mut grouped: BTreeMap<u32, Vec<ClauseRef>> = BTreeMap::new();
    for clause in catalog.clauses() {
        grouped
            .entry(clause.reference.requirement)
            .or_default()
            .push(clause.reference);
    }
    grouped
}

fn task(number: usize, description: String, details: Vec<String>) -> Task {
    Task {
        id: number.to_string(),
        description,
        status: TaskStatus::NotStarted,
        details,
        requirements: Vec::new(),
        parent: None,
        sub_tasks: Vec::new(),
        line: 0,
    }
}

fn title_case(feature_name: &str) -> String {
    feature_name
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentType;
    use crate::parser::tasks::parse_tasks;
    use crate::tasks::completion::{all_dangling_references, check_hierarchy};
    use crate::workflow::rules_for;

    const REQUIREMENTS: &str = r#"# Requirements Document

## Requirements

### Requirement 1

**User Story:** As a user, I want to log in, so that I can see my account

#### Acceptance Criteria

1. WHEN a user submits valid credentials THEN the system SHALL create a session
2. IF the password is wrong THEN the system SHALL reject the login attempt

### Requirement 2

1. WHEN a session expires THEN the system SHALL log the user out
"#;

    #[test]
    fn test_generated_requirements_are_valid() {
        let content = generate_requirements("user-auth", "Login system");
        assert!(content.contains("### Requirement 1"));
        assert!(content.contains("User Auth: Login system"));
        assert!(rules_for(DocumentType::Requirements).check(&content).is_valid());
    }

    #[test]
    fn test_generated_design_covers_requirements() {
        let design = generate_design("user-auth", REQUIREMENTS);
        assert!(rules_for(DocumentType::Design).check(&design).is_valid());
        assert!(design.contains("2 requirement(s) with 3 acceptance criteria"));
        assert!(design.contains("- As a user, I want to log in, so that I can see my account"));
        assert!(design.contains("- Requirement 1: criteria 1.1, 1.2"));
        assert!(design.contains("- Requirement 2: criteria 2.1"));
    }

    #[test]
    fn test_generated_tasks_reference_only_real_criteria() {
        let design = generate_design("user-auth", REQUIREMENTS);
        let tasks = generate_tasks("user-auth", REQUIREMENTS, &design);
        assert!(rules_for(DocumentType::Tasks).check(&tasks).is_valid());

        let parsed = parse_tasks(&tasks).unwrap();
        assert!(parsed.prose.is_empty());
        check_hierarchy(&parsed.list).unwrap();
        let catalog = RequirementCatalog::parse(REQUIREMENTS);
        assert!(all_dangling_references(&parsed.list, &catalog).is_empty());

        let descriptions: Vec<&str> = parsed
            .list
            .tasks
            .iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(
            descriptions,
            vec![
                "Set up project structure for User Auth",
                "Implement User Auth Service",
                "Implement User Auth Store",
                "Satisfy Requirement 1",
                "Satisfy Requirement 2",
                "Write tests for User Auth",
            ]
        );

        let satisfy = &parsed.list.tasks[3];
        assert_eq!(satisfy.sub_tasks.len(), 2);
        assert_eq!(satisfy.sub_tasks[1].id, "4.2");
        assert_eq!(satisfy.sub_tasks[1].requirements, vec![ClauseRef::new(1, 2)]);
    }

    #[test]
    fn test_components_come_from_their_section_only() {
        let design = "# Design\n\n## Overview\n\n**Note**: not a component\n\n## Components\n\n- **Parser**: reads input\n- **Parser**: duplicate\n**Writer**\n\n## Data Models\n\n- **Session**: id and expiry\n";
        let components = design_components(design);
        assert_eq!(
            components,
            vec![
                ("Parser".to_string(), "reads input".to_string()),
                ("Writer".to_string(), String::new()),
            ]
        );
    }
}
