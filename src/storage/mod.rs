//! Persistence of specification bundles
//!
//! A bundle is a directory named after the feature holding up to three
//! documents and the `spec.yaml` metadata file. The workflow only talks to
//! the [`SpecRepository`] trait; [`FsSpecRepository`] is the on-disk
//! implementation.

pub mod fs;

pub use fs::FsSpecRepository;

use crate::error::{SpecError, SpecResult};
use crate::models::{check_feature_name, DocumentType, Specification};
use std::path::PathBuf;

/// Metadata file of a bundle
pub const METADATA_FILE: &str = "spec.yaml";

pub trait SpecRepository {
    /// Directory of a specification bundle (may not exist)
    fn spec_dir(&self, feature: &str) -> PathBuf;

    fn exists(&self, feature: &str) -> SpecResult<bool>;

    /// Create a new bundle holding only metadata
    fn create(&self, spec: &Specification) -> SpecResult<()>;

    fn load(&self, feature: &str) -> SpecResult<Specification>;

    fn save(&self, spec: &Specification) -> SpecResult<()>;

    /// Raw document text, `None` if the document was never written
    fn read_document(&self, feature: &str, document: DocumentType)
        -> SpecResult<Option<String>>;

    /// Replace a document as a whole; a failed write leaves the old content
    fn write_document(&self, feature: &str, document: DocumentType, content: &str)
        -> SpecResult<()>;

    /// Remove the bundle, returning the names of the removed files
    fn delete(&self, feature: &str) -> SpecResult<Vec<String>>;

    /// Feature names of all bundles, sorted
    fn list(&self) -> SpecResult<Vec<String>>;
}

/// Reject names that are not kebab-case before touching the filesystem
pub fn validate_feature_name(name: &str) -> SpecResult<()> {
    check_feature_name(name).map_err(|reason| SpecError::InvalidFeatureName {
        name: name.to_string(),
        reason,
    })
}
