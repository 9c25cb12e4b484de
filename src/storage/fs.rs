use super::{validate_feature_name, SpecRepository, METADATA_FILE};
use crate::error::{SpecError, SpecResult};
use crate::models::{check_feature_name, DocumentType, Specification};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Specification bundles stored under one specs directory
#[derive(Debug, Clone)]
pub struct FsSpecRepository {
    root: PathBuf,
}

impl FsSpecRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn metadata_path(&self, feature: &str) -> PathBuf {
        self.spec_dir(feature).join(METADATA_FILE)
    }

    fn require(&self, feature: &str) -> SpecResult<()> {
        if self.exists(feature)? {
            Ok(())
        } else {
            Err(SpecError::SpecNotFound(feature.to_string()))
        }
    }
}

impl SpecRepository for FsSpecRepository {
    fn spec_dir(&self, feature: &str) -> PathBuf {
        self.root.join(feature)
    }

    fn exists(&self, feature: &str) -> SpecResult<bool> {
        validate_feature_name(feature)?;
        Ok(self.metadata_path(feature).is_file())
    }

    fn create(&self, spec: &Specification) -> SpecResult<()> {
        if self.exists(&spec.feature_name)? {
            return Err(SpecError::SpecAlreadyExists(spec.feature_name.clone()));
        }
        std::fs::create_dir_all(self.spec_dir(&spec.feature_name))?;
        self.save(spec)?;
        info!(feature = %spec.feature_name, "created specification bundle");
        Ok(())
    }

    fn load(&self, feature: &str) -> SpecResult<Specification> {
        self.require(feature)?;
        let content = std::fs::read_to_string(self.metadata_path(feature))?;
        Ok(serde_yaml::from_str(&content)?)
    }

    fn save(&self, spec: &Specification) -> SpecResult<()> {
        validate_feature_name(&spec.feature_name)?;
        let content = serde_yaml::to_string(spec)?;
        write_atomic(&self.metadata_path(&spec.feature_name), &content)
    }

    fn read_document(
        &self,
        feature: &str,
        document: DocumentType,
    ) -> SpecResult<Option<String>> {
        self.require(feature)?;
        let path = self.spec_dir(feature).join(document.file_name());
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_document(
        &self,
        feature: &str,
        document: DocumentType,
        content: &str,
    ) -> SpecResult<()> {
        self.require(feature)?;
        let path = self.spec_dir(feature).join(document.file_name());
        write_atomic(&path, content)?;
        debug!(feature, document = %document, bytes = content.len(), "wrote document");
        Ok(())
    }

    fn delete(&self, feature: &str) -> SpecResult<Vec<String>> {
        self.require(feature)?;
        let dir = self.spec_dir(feature);

        let mut removed = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                removed.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        removed.sort();

        std::fs::remove_dir_all(&dir)?;
        info!(feature, files = removed.len(), "deleted specification bundle");
        Ok(removed)
    }

    fn list(&self) -> SpecResult<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut features = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if check_feature_name(&name).is_ok() && entry.path().join(METADATA_FILE).is_file() {
                features.push(name);
            }
        }
        features.sort();
        Ok(features)
    }
}

/// Write through a temporary file in the same directory, then rename
fn write_atomic(path: &Path, content: &str) -> SpecResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
