//! Phase-gated workflow of a specification
//!
//! REQUIREMENTS -> DESIGN -> TASKS -> COMPLETE, one step at a time and only
//! with explicit approval. Revising an earlier document moves the workflow
//! back to that document's phase.

pub mod engine;
pub mod generate;
pub mod rules;

pub use engine::{TaskStatusOutcome, UpdateOutcome, WorkflowEngine};
pub use rules::{rules_for, DocumentRules};
