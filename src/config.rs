//! specd configuration
//!
//! Loaded from `<project-root>/specd.toml`, falling back to the user-level
//! `specd/specd.toml` in the platform config directory, then defaults.
//! `SPECD_*` environment variables override file values.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "specd.toml";

/// Default bound on nested `#[[file:...]]` resolution
pub const DEFAULT_REFERENCE_DEPTH: usize = 8;

/// Default maximum document size in bytes
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 1_000_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpecdConfig {
    /// Directory holding specification bundles, relative to the project root
    pub specs_dir: PathBuf,

    /// Maximum accepted document size in bytes
    pub max_document_size: usize,

    /// Maximum nesting of file references resolved on read
    pub reference_depth: usize,

    /// Default tracing filter when RUST_LOG is not set
    pub log_level: String,

    pub linking: LinkingConfig,
}

/// Requirement auto-linking settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkingConfig {
    /// Synthesize `_Requirements:_` lines for unannotated tasks
    pub enabled: bool,

    /// Minimum share of task terms found in a clause (0, 1]
    pub min_score: f64,

    /// Minimum number of shared terms
    pub min_shared_terms: usize,

    /// Maximum clauses linked to one task
    pub max_links: usize,
}

impl Default for SpecdConfig {
    fn default() -> Self {
        Self {
            specs_dir: PathBuf::from("specs"),
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            reference_depth: DEFAULT_REFERENCE_DEPTH,
            log_level: "info".to_string(),
            linking: LinkingConfig::default(),
        }
    }
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_score: 0.5,
            min_shared_terms: 2,
            max_links: 3,
        }
    }
}

impl SpecdConfig {
    /// Load configuration for a project
    pub fn load(project_root: &Path) -> Result<Self> {
        let project_file = project_root.join(CONFIG_FILE);
        let user_file = dirs::config_dir().map(|dir| dir.join("specd").join(CONFIG_FILE));

        let mut config = if project_file.exists() {
            Self::from_file(&project_file)?
        } else {
            match user_file.filter(|path| path.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply `SPECD_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("SPECD_SPECS_DIR") {
            self.specs_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("SPECD_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(size) = lookup("SPECD_MAX_DOCUMENT_SIZE") {
            self.max_document_size = size
                .parse()
                .with_context(|| format!("SPECD_MAX_DOCUMENT_SIZE is not a number: {}", size))?;
        }
        if let Some(depth) = lookup("SPECD_REFERENCE_DEPTH") {
            self.reference_depth = depth
                .parse()
                .with_context(|| format!("SPECD_REFERENCE_DEPTH is not a number: {}", depth))?;
        }
        if let Some(flag) = lookup("SPECD_AUTO_LINK") {
            self.linking.enabled = matches!(
                flag.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.reference_depth == 0 {
            bail!("reference_depth must be at least 1");
        }
        if self.max_document_size == 0 {
            bail!("max_document_size must be at least 1");
        }
        if !(self.linking.min_score > 0.0 && self.linking.min_score <= 1.0) {
            bail!(
                "linking.min_score must be in (0, 1], got {}",
                self.linking.min_score
            );
        }
        Ok(())
    }

    /// Absolute location of the specs directory
    pub fn specs_root(&self, project_root: &Path) -> PathBuf {
        if self.specs_dir.is_absolute() {
            self.specs_dir.clone()
        } else {
            project_root.join(&self.specs_dir)
        }
    }
}
