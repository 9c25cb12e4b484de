//! Command-line interface
//!
//! Every command opens the [`Workspace`](crate::services::Workspace) of the
//! project root and calls the shared services; output is colored for humans
//! unless `--json` is given.

pub mod document;
pub mod serve;
pub mod spec;
pub mod task;

use crate::models::Finding;
use colored::Colorize;

/// Print findings below a command's output
pub(crate) fn print_findings(findings: &[Finding]) {
    if findings.is_empty() {
        return;
    }
    eprintln!("\n{}", "Findings:".yellow().bold());
    for finding in findings {
        eprintln!("   {}", finding.format());
    }
}
