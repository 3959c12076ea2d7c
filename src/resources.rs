//! Schema resource loading
//!
//! The compiler fetches the targets of `include`/`import`/`redefine`/
//! `override` through the [`ResourceLoader`] trait and never performs I/O
//! itself. Transport policy (timeouts, caching, defusing) belongs to the
//! implementation. Two implementations are provided: an in-memory map for
//! tests and self-contained schema sets, and a plain filesystem loader.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::documents::{Document, Element};
use crate::error::{Error, Result};

/// A fetched schema document
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    /// Root element of the fetched document
    pub root: Arc<Element>,
    /// Base URL for resolving nested relative locations
    pub base_url: Option<Url>,
    /// The location the resource was requested under, resolved
    pub location: String,
}

/// Resource collaborator consumed by the schema compiler
pub trait ResourceLoader {
    /// Fetch the document at `location`, resolved against `base_url`
    fn fetch(&self, location: &str, base_url: Option<&Url>) -> Result<ResourceHandle>;
}

/// Join a location against an optional base URL
pub fn resolve_location(location: &str, base_url: Option<&Url>) -> String {
    match base_url {
        Some(base) => base
            .join(location)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| location.to_string()),
        None => location.to_string(),
    }
}

/// In-memory loader backed by a location -> source map
#[derive(Debug, Default)]
pub struct InMemoryLoader {
    sources: HashMap<String, String>,
}

impl InMemoryLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under a location key
    pub fn add(mut self, location: impl Into<String>, source: impl Into<String>) -> Self {
        self.sources.insert(location.into(), source.into());
        self
    }
}

impl ResourceLoader for InMemoryLoader {
    fn fetch(&self, location: &str, base_url: Option<&Url>) -> Result<ResourceHandle> {
        let resolved = resolve_location(location, base_url);
        let source = self
            .sources
            .get(&resolved)
            .or_else(|| self.sources.get(location))
            .ok_or_else(|| Error::Resource(format!("no source registered for '{}'", resolved)))?;

        let doc = Document::parse(source)?;
        Ok(ResourceHandle {
            root: doc.root,
            base_url: None,
            location: resolved,
        })
    }
}

/// Filesystem loader resolving locations relative to a base directory
#[derive(Debug)]
pub struct FileLoader {
    base_dir: Option<PathBuf>,
}

impl FileLoader {
    /// Create a loader with no implicit base directory
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Create a loader that resolves bare locations against a directory
    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: Some(base_dir.as_ref().to_path_buf()),
        }
    }

    fn resolve_path(&self, location: &str, base_url: Option<&Url>) -> PathBuf {
        if let Some(base) = base_url {
            if let Ok(joined) = base.join(location) {
                if let Ok(path) = joined.to_file_path() {
                    return path;
                }
            }
        }
        match &self.base_dir {
            Some(dir) => dir.join(location),
            None => PathBuf::from(location),
        }
    }
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLoader for FileLoader {
    fn fetch(&self, location: &str, base_url: Option<&Url>) -> Result<ResourceHandle> {
        let path = self.resolve_path(location, base_url);
        let source = std::fs::read_to_string(&path)
            .map_err(|e| Error::Resource(format!("failed to read '{}': {}", path.display(), e)))?;
        let doc = Document::parse(&source)?;

        let base_url = Url::from_file_path(
            path.canonicalize().unwrap_or_else(|_| path.clone()),
        )
        .ok();

        Ok(ResourceHandle {
            root: doc.root,
            base_url,
            location: path.display().to_string(),
        })
    }
}

/// Loader that refuses every fetch, for self-contained schemas
#[derive(Debug, Default)]
pub struct DenyAllLoader;

impl ResourceLoader for DenyAllLoader {
    fn fetch(&self, location: &str, _base_url: Option<&Url>) -> Result<ResourceHandle> {
        Err(Error::Resource(format!(
            "resource loading is disabled (requested '{}')",
            location
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#;

    #[test]
    fn test_in_memory_loader() {
        let loader = InMemoryLoader::new().add("a.xsd", SCHEMA);
        let handle = loader.fetch("a.xsd", None).unwrap();
        assert!(handle.root.is_xsd("schema"));
        assert!(loader.fetch("b.xsd", None).is_err());
    }

    #[test]
    fn test_file_loader() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SCHEMA).unwrap();

        let loader = FileLoader::new();
        let handle = loader.fetch(file.path().to_str().unwrap(), None).unwrap();
        assert!(handle.root.is_xsd("schema"));
        assert!(handle.base_url.is_some());
    }

    #[test]
    fn test_deny_all_loader() {
        assert!(DenyAllLoader.fetch("a.xsd", None).is_err());
    }

    #[test]
    fn test_resolve_location() {
        let base = Url::parse("file:///schemas/main.xsd").unwrap();
        assert_eq!(
            resolve_location("types.xsd", Some(&base)),
            "file:///schemas/types.xsd"
        );
        assert_eq!(resolve_location("types.xsd", None), "types.xsd");
    }
}
