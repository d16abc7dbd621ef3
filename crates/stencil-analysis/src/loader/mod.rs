//! Template source loading: per-file reads, metadata, content hashing.
//!
//! The loader is the entry point of the per-template pipeline. A file that
//! cannot be read or decoded produces a `LoadError` for that template only;
//! loader failures never abort the run.

pub mod hasher;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use stencil_core::errors::LoadError;

/// An immutable, fully loaded template file.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    /// Corpus-wide name: the listed path, relative to the base directory.
    pub name: String,
    /// Resolved on-disk path.
    pub path: PathBuf,
    pub content: String,
    /// xxh3-64 of the content, 16 hex chars.
    pub content_hash: String,
    /// Content length in bytes.
    pub size: u64,
    pub line_count: usize,
    pub last_modified: Option<SystemTime>,
}

impl TemplateSource {
    /// Build a source record from in-memory content, used by tests and by
    /// callers that already hold the text.
    pub fn from_content(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        let content = content.into();
        Self {
            path: PathBuf::from(&name),
            content_hash: hasher::hash_content(content.as_bytes()),
            size: content.len() as u64,
            line_count: content.lines().count(),
            last_modified: None,
            name,
            content,
        }
    }
}

/// Derive the corpus-wide template name for a listed path.
///
/// Paths under the base directory are named by their relative path with
/// forward slashes; anything else keeps the listed path as its name.
pub fn template_name(base: &Path, listed: &str) -> String {
    let full = resolve(base, listed);
    match full.strip_prefix(base) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => listed.to_string(),
    }
}

fn resolve(base: &Path, listed: &str) -> PathBuf {
    let p = Path::new(listed);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// Load one template file relative to the base directory.
pub fn load_template(base: &Path, listed: &str) -> Result<TemplateSource, LoadError> {
    let path = resolve(base, listed);
    let name = template_name(base, listed);

    let bytes = fs::read(&path).map_err(|source| LoadError::Io {
        path: name.clone(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|_| LoadError::Decode { path: name.clone() })?;

    let last_modified = fs::metadata(&path).ok().and_then(|m| m.modified().ok());

    Ok(TemplateSource {
        content_hash: hasher::hash_content(content.as_bytes()),
        size: content.len() as u64,
        line_count: content.lines().count(),
        last_modified,
        name,
        path,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_file_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.tmpl");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "{{{{ title }}}}").unwrap();
        writeln!(f, "body").unwrap();

        let src = load_template(dir.path(), "page.tmpl").unwrap();
        assert_eq!(src.name, "page.tmpl");
        assert_eq!(src.line_count, 2);
        assert_eq!(src.size, src.content.len() as u64);
        assert_eq!(src.content_hash.len(), 16);
        assert!(src.last_modified.is_some());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_template(dir.path(), "absent.tmpl").unwrap_err();
        assert_eq!(err.path(), "absent.tmpl");
    }

    #[test]
    fn non_utf8_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.tmpl");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let err = load_template(dir.path(), "binary.tmpl").unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn nested_paths_use_forward_slash_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("layouts")).unwrap();
        fs::write(dir.path().join("layouts/base.tmpl"), "x").unwrap();

        let src = load_template(dir.path(), "layouts/base.tmpl").unwrap();
        assert_eq!(src.name, "layouts/base.tmpl");
    }
}
