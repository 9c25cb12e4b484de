//! Service layer for specd
//!
//! The seven specification operations live here and are shared by the MCP
//! tools and the CLI commands. Each returns a serializable outcome; the
//! callers decide how to present it.

pub mod document_service;
pub mod spec_service;
pub mod tasks_service;

pub use document_service::{read_document, update_document, ReadDocumentInput, UpdateDocumentInput};
pub use spec_service::{
    create_specification, delete_specification, list_specifications, specification_status,
    CreateSpecInput,
};
pub use tasks_service::{mark_task_status, next_or_named_task, MarkTaskInput};

use crate::config::SpecdConfig;
use crate::error::SpecResult;
use crate::resolver::FileReferenceResolver;
use crate::storage::{FsSpecRepository, SpecRepository};
use crate::tasks::TaskListProcessor;
use crate::workflow::WorkflowEngine;
use crate::Result;
use std::path::{Path, PathBuf};

/// Everything an operation needs: configuration, storage and the task processor
pub struct Workspace {
    project_root: PathBuf,
    config: SpecdConfig,
    repo: FsSpecRepository,
    processor: TaskListProcessor,
}

impl Workspace {
    /// Open the workspace of a project, loading its configuration
    pub fn open(project_root: &Path) -> Result<Self> {
        let config = SpecdConfig::load(project_root)?;
        Ok(Self::with_config(project_root, config))
    }

    pub fn with_config(project_root: &Path, config: SpecdConfig) -> Self {
        let repo = FsSpecRepository::new(config.specs_root(project_root));
        let processor = TaskListProcessor::from_config(&config.linking);
        Self {
            project_root: project_root.to_path_buf(),
            config,
            repo,
            processor,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config(&self) -> &SpecdConfig {
        &self.config
    }

    pub fn repo(&self) -> &FsSpecRepository {
        &self.repo
    }

    pub fn processor(&self) -> &TaskListProcessor {
        &self.processor
    }

    pub fn engine(&self) -> WorkflowEngine<'_, FsSpecRepository> {
        WorkflowEngine::new(&self.repo, &self.processor, self.config.max_document_size)
    }

    /// Reference resolver rooted at a specification's directory
    pub fn resolver(&self, feature: &str) -> SpecResult<FileReferenceResolver> {
        FileReferenceResolver::new(&self.repo.spec_dir(feature), self.config.reference_depth)
    }
}
