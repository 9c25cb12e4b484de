//! File reference resolution
//!
//! Documents may embed `#[[file:<relative-path>]]` markers. On read, each
//! marker is replaced by the content of the referenced file, recursively up
//! to a bounded depth. Paths are resolved against the specification
//! directory and must stay inside it. Stored documents are never modified.

use crate::error::{SpecError, SpecResult};
use regex::Regex;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\[\[file:([^\]]*)\]\]").expect("marker pattern is valid"));

/// An inclusion marker found in document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference<'a> {
    /// The raw marker, e.g. `#[[file:api/openapi.yaml]]`
    pub marker: &'a str,
    /// Path inside the marker, relative to the specification directory
    pub path: &'a str,
    /// Byte range of the marker in the scanned text
    pub span: Range<usize>,
}

/// A reference together with the content it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub marker: String,
    pub path: String,
    pub content: String,
}

/// Lazily scan `text` for markers, in document order
///
/// The scan has no side effects; calling it again restarts from the
/// beginning.
pub fn extract_references(text: &str) -> impl Iterator<Item = FileReference<'_>> + '_ {
    MARKER.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let path = caps.get(1)?;
        Some(FileReference {
            marker: whole.as_str(),
            path: path.as_str().trim(),
            span: whole.range(),
        })
    })
}

/// Resolves markers against one specification directory
#[derive(Debug, Clone)]
pub struct FileReferenceResolver {
    root: PathBuf,
    max_depth: usize,
}

impl FileReferenceResolver {
    /// Create a resolver rooted at `base_dir`, which must exist
    pub fn new(base_dir: &Path, max_depth: usize) -> SpecResult<Self> {
        Ok(Self {
            root: base_dir.canonicalize()?,
            max_depth: max_depth.max(1),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the file a single reference points to
    pub fn resolve(&self, reference: &FileReference<'_>) -> SpecResult<ResolvedReference> {
        let path = self.resolve_path(reference.path)?;
        let content = read_referenced(&path, reference.path)?;
        Ok(ResolvedReference {
            marker: reference.marker.to_string(),
            path: reference.path.to_string(),
            content,
        })
    }

    /// Replace every marker in `text` with the referenced content
    pub fn substitute(&self, text: &str) -> SpecResult<String> {
        let mut stack = Vec::new();
        self.substitute_nested(text, &mut stack)
    }

    /// Like [`Self::substitute`], treating `origin` as the document being
    /// expanded so that files referring back to it are reported as a cycle
    pub fn substitute_document(&self, text: &str, origin: &Path) -> SpecResult<String> {
        let mut stack = Vec::new();
        if let Ok(origin) = origin.canonicalize() {
            stack.push(origin);
        }
        self.substitute_nested(text, &mut stack)
    }

    fn substitute_nested(&self, text: &str, stack: &mut Vec<PathBuf>) -> SpecResult<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for reference in extract_references(text) {
            let path = self.resolve_path(reference.path)?;

            if let Some(pos) = stack.iter().position(|p| *p == path) {
                let chain = stack[pos..]
                    .iter()
                    .chain(std::iter::once(&path))
                    .map(|p| self.display(p))
                    .collect();
                return Err(SpecError::FileReferenceCycle { chain });
            }

            let nesting = stack.iter().filter(|p| p.starts_with(&self.root)).count();
            if nesting >= self.max_depth {
                return Err(SpecError::FileReferenceInvalid {
                    path: reference.path.to_string(),
                    reason: format!("nesting exceeds {} levels", self.max_depth),
                });
            }

            debug!(path = %reference.path, depth = nesting + 1, "resolving file reference");
            let content = read_referenced(&path, reference.path)?;
            stack.push(path);
            let expanded = self.substitute_nested(&content, stack)?;
            stack.pop();

            out.push_str(&text[last..reference.span.start]);
            out.push_str(&expanded);
            last = reference.span.end;
        }

        out.push_str(&text[last..]);
        Ok(out)
    }

    /// Canonical path of a reference, guaranteed to be a file inside the root
    fn resolve_path(&self, raw: &str) -> SpecResult<PathBuf> {
        let invalid = |reason: &str| SpecError::FileReferenceInvalid {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("empty path"));
        }
        let relative = Path::new(raw);
        if relative.is_absolute() || escapes_root(relative) {
            return Err(invalid("path escapes the specification directory"));
        }

        let canonical = match self.root.join(relative).canonicalize() {
            Ok(path) => path,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SpecError::FileReferenceNotFound {
                    path: raw.to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        };

        // Symlinks may point outside even when the relative path does not
        if !canonical.starts_with(&self.root) {
            return Err(invalid("path escapes the specification directory"));
        }
        if !canonical.is_file() {
            return Err(invalid("not a regular file"));
        }
        Ok(canonical)
    }

    fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Read a resolved file, reporting failures against the marker's path
fn read_referenced(path: &Path, raw: &str) -> SpecResult<String> {
    std::fs::read_to_string(path).map_err(|err| SpecError::FileReferenceInvalid {
        path: raw.to_string(),
        reason: err.to_string(),
    })
}

/// True if `..` components climb above the starting directory
fn escapes_root(relative: &Path) -> bool {
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return true,
            },
            Component::RootDir | Component::Prefix(_) => return true,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileReferenceResolver) {
        let temp_dir = TempDir::new().unwrap();
        let spec_dir = temp_dir.path().join("user-auth");
        std::fs::create_dir_all(spec_dir.join("api")).unwrap();
        let resolver = FileReferenceResolver::new(&spec_dir, 8).unwrap();
        (temp_dir, resolver)
    }

    #[test]
    fn test_extract_references_in_order() {
        let text = "See #[[file:api/openapi.yaml]] and #[[file: notes.md ]].";
        let refs: Vec<_> = extract_references(text).collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].path, "api/openapi.yaml");
        assert_eq!(refs[0].marker, "#[[file:api/openapi.yaml]]");
        assert_eq!(&text[refs[0].span.clone()], refs[0].marker);
        assert_eq!(refs[1].path, "notes.md");

        // Re-scanning yields the same result
        let again: Vec<_> = extract_references(text).collect();
        assert_eq!(refs, again);
    }

    #[test]
    fn test_text_without_markers_is_unchanged() {
        let (_tmp, resolver) = setup();
        let text = "# Design\n\nNo references here, just [links](x.md).\n";
        assert_eq!(resolver.substitute(text).unwrap(), text);
    }

    #[test]
    fn test_substitute_nested() {
        let (_tmp, resolver) = setup();
        std::fs::write(resolver.root().join("api/schema.md"), "schema v1").unwrap();
        std::fs::write(
            resolver.root().join("api/overview.md"),
            "Overview: #[[file:api/schema.md]]",
        )
        .unwrap();

        let result = resolver
            .substitute("Start\n#[[file:api/overview.md]]\nEnd")
            .unwrap();
        assert_eq!(result, "Start\nOverview: schema v1\nEnd");
    }

    #[test]
    fn test_resolve_single_reference() {
        let (_tmp, resolver) = setup();
        std::fs::write(resolver.root().join("notes.md"), "hello").unwrap();
        let text = "#[[file:notes.md]]";
        let reference = extract_references(text).next().unwrap();
        let resolved = resolver.resolve(&reference).unwrap();
        assert_eq!(resolved.content, "hello");
        assert_eq!(resolved.path, "notes.md");
    }

    #[test]
    fn test_missing_file() {
        let (_tmp, resolver) = setup();
        let err = resolver.substitute("#[[file:missing.md]]").unwrap_err();
        assert!(matches!(err, SpecError::FileReferenceNotFound { ref path } if path == "missing.md"));
    }

    #[test]
    fn test_non_utf8_file_is_invalid_reference() {
        let (_tmp, resolver) = setup();
        std::fs::write(resolver.root().join("bin.md"), [0xff, 0xfe, 0x00]).unwrap();

        let err = resolver.substitute("see #[[file:bin.md]]").unwrap_err();
        assert!(
            matches!(err, SpecError::FileReferenceInvalid { ref path, ref reason } if path == "bin.md" && !reason.is_empty()),
            "got {:?}",
            err
        );

        let reference = extract_references("#[[file:bin.md]]").next().unwrap();
        let err = resolver.resolve(&reference).unwrap_err();
        assert_eq!(err.code(), "FILE_REFERENCE_INVALID");
    }

    #[test]
    fn test_path_traversal_rejected() {
        let (tmp, resolver) = setup();
        std::fs::write(tmp.path().join("secret.txt"), "secret").unwrap();

        for text in [
            "#[[file:../secret.txt]]",
            "#[[file:api/../../secret.txt]]",
            "#[[file:/etc/passwd]]",
            "#[[file:]]",
        ] {
            let err = resolver.substitute(text).unwrap_err();
            assert!(
                matches!(err, SpecError::FileReferenceInvalid { .. }),
                "{} gave {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_inner_parent_dir_stays_inside() {
        let (_tmp, resolver) = setup();
        std::fs::write(resolver.root().join("notes.md"), "ok").unwrap();
        assert_eq!(resolver.substitute("#[[file:api/../notes.md]]").unwrap(), "ok");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (tmp, resolver) = setup();
        std::fs::write(tmp.path().join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(
            tmp.path().join("secret.txt"),
            resolver.root().join("link.md"),
        )
        .unwrap();
        let err = resolver.substitute("#[[file:link.md]]").unwrap_err();
        assert!(matches!(err, SpecError::FileReferenceInvalid { .. }));
    }

    #[test]
    fn test_cycle_detected() {
        let (_tmp, resolver) = setup();
        std::fs::write(resolver.root().join("a.md"), "A includes #[[file:b.md]]").unwrap();
        std::fs::write(resolver.root().join("b.md"), "B includes #[[file:a.md]]").unwrap();

        let err = resolver.substitute("#[[file:a.md]]").unwrap_err();
        match err {
            SpecError::FileReferenceCycle { chain } => {
                assert_eq!(chain, vec!["a.md", "b.md", "a.md"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_reference_back_to_origin_is_cycle() {
        let (_tmp, resolver) = setup();
        let origin = resolver.root().join("design.md");
        std::fs::write(&origin, "Design #[[file:extra.md]]").unwrap();
        std::fs::write(resolver.root().join("extra.md"), "see #[[file:design.md]]").unwrap();

        let err = resolver
            .substitute_document("Design #[[file:extra.md]]", &origin)
            .unwrap_err();
        assert!(matches!(err, SpecError::FileReferenceCycle { .. }));
    }

    #[test]
    fn test_depth_bound() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = FileReferenceResolver::new(temp_dir.path(), 2).unwrap();
        std::fs::write(temp_dir.path().join("1.md"), "#[[file:2.md]]").unwrap();
        std::fs::write(temp_dir.path().join("2.md"), "#[[file:3.md]]").unwrap();
        std::fs::write(temp_dir.path().join("3.md"), "bottom").unwrap();

        assert_eq!(resolver.substitute("#[[file:2.md]]").unwrap(), "bottom");
        let err = resolver.substitute("#[[file:1.md]]").unwrap_err();
        assert!(matches!(err, SpecError::FileReferenceInvalid { .. }));
    }

    #[test]
    fn test_same_file_twice_is_not_a_cycle() {
        let (_tmp, resolver) = setup();
        std::fs::write(resolver.root().join("n.md"), "x").unwrap();
        assert_eq!(
            resolver.substitute("#[[file:n.md]] #[[file:n.md]]").unwrap(),
            "x x"
        );
    }
}
