use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::{Error, Result};
use crate::paths::normalize;

/// Where template sources come from.
///
/// Paths given to `read` are already resolved and normalized by the engine.
#[async_trait]
pub trait TemplateLoader: Send + Sync {
    /// Returns the source of the template at `path`, failing with
    /// `ErrorKind::TemplateNotFound` if there is none
    async fn read(&self, path: &Path) -> Result<String>;
}

/// Reads templates from the filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

#[async_trait]
impl TemplateLoader for FsLoader {
    async fn read(&self, path: &Path) -> Result<String> {
        match tokio::fs::read_to_string(path).await {
            Ok(source) => Ok(source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::template_not_found(path.display()))
            }
            Err(e) => Err(Error::from(e)),
        }
    }
}

/// Serves templates from memory, for tests and templates embedded in a binary
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    /// Creates an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the template at `path`
    pub fn insert(&mut self, path: impl AsRef<Path>, source: impl Into<String>) {
        self.templates.insert(normalize(path.as_ref()), source.into());
    }

    /// Builder version of `insert`
    pub fn with(mut self, path: impl AsRef<Path>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }
}

#[async_trait]
impl TemplateLoader for MemoryLoader {
    async fn read(&self, path: &Path) -> Result<String> {
        self.templates
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| Error::template_not_found(path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[tokio::test]
    async fn memory_loader_normalizes_paths() {
        let loader = MemoryLoader::new().with("./pages/../index.html", "hi");
        assert_eq!(loader.read(Path::new("index.html")).await.unwrap(), "hi");
        let err = loader.read(Path::new("missing.html")).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::TemplateNotFound(ref p) if p == "missing.html"));
    }

    #[tokio::test]
    async fn fs_loader_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.html");
        std::fs::write(&path, "Hello {{ name }}").unwrap();

        assert_eq!(FsLoader.read(&path).await.unwrap(), "Hello {{ name }}");
        let err = FsLoader.read(&dir.path().join("nope.html")).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::TemplateNotFound(_)));
    }
}
