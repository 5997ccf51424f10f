use std::io::ErrorKind;
use std::path::PathBuf;

use log::trace;

use super::{FetchError, SourceProvider};
use crate::directive::SourceKind;

/// Reads directives' sources from the local filesystem.
///
/// Relative locators are resolved against `base_dir` (normally the directory
/// of the Markdown document). The resolved file must live under `root` unless
/// [`LocalSource::allow_outside_root`] is set.
#[derive(Debug, Clone)]
pub struct LocalSource {
    base_dir: PathBuf,
    root: PathBuf,
    allow_outside_root: bool,
}

impl LocalSource {
    pub fn new(base_dir: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            root: root.into(),
            allow_outside_root: false,
        }
    }

    pub fn allow_outside_root(mut self, allow: bool) -> Self {
        self.allow_outside_root = allow;
        self
    }

    /// Canonical path of `locator`, checked against the containment root.
    pub async fn resolve_path(&self, locator: &str) -> Result<PathBuf, FetchError> {
        let candidate = self.base_dir.join(locator);
        let path = tokio::fs::canonicalize(&candidate)
            .await
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => FetchError::NotFound(candidate.display().to_string()),
                _ => FetchError::Io {
                    path: candidate.clone(),
                    source,
                },
            })?;

        if self.allow_outside_root {
            return Ok(path);
        }

        let root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|source| FetchError::Io {
                path: self.root.clone(),
                source,
            })?;
        if path.starts_with(&root) {
            Ok(path)
        } else {
            Err(FetchError::OutsideRoot { path, root })
        }
    }
}

impl SourceProvider for LocalSource {
    async fn fetch(&self, _kind: SourceKind, locator: &str) -> Result<String, FetchError> {
        let path = self.resolve_path(locator).await?;
        trace!("Reading {}", path.display());
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| FetchError::Io { path, source })
    }
}
