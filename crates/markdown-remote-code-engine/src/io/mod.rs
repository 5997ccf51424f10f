//! Fetching source content and reading/writing Markdown documents.

mod local;
mod memory;
mod remote;

pub use local::LocalSource;
pub use memory::MemorySource;
pub use remote::RemoteSource;

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::directive::SourceKind;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Source not found: {0}")]
    NotFound(String),
    #[error("Unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is outside of {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("Unable to fetch file at {locator} (HTTP {status})")]
    Status { locator: String, status: u16 },
    #[error("Unable to fetch file at {locator}: {message}")]
    Transport { locator: String, message: String },
}

/// Produces the raw text behind a directive's locator.
///
/// Locators arrive already root-dir-substituted and unescaped.
pub trait SourceProvider {
    fn fetch(
        &self,
        kind: SourceKind,
        locator: &str,
    ) -> impl Future<Output = Result<String, FetchError>>;
}

/// Routes local directives to a [`LocalSource`] and remote ones to a
/// [`RemoteSource`].
#[derive(Debug, Clone)]
pub struct Sources {
    local: LocalSource,
    remote: RemoteSource,
}

impl Sources {
    pub fn new(local: LocalSource, remote: RemoteSource) -> Self {
        Self { local, remote }
    }
}

impl SourceProvider for Sources {
    async fn fetch(&self, kind: SourceKind, locator: &str) -> Result<String, FetchError> {
        match kind {
            SourceKind::Local => self.local.fetch(kind, locator).await,
            SourceKind::Remote => self.remote.fetch(kind, locator).await,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a markdown document and return its content
pub fn read_document(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(IoError::Io)
}

/// Write content to a markdown document
pub fn write_document(path: &Path, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(path, content).map_err(IoError::Io)
}
