use std::collections::HashMap;

use super::{FetchError, SourceProvider};
use crate::directive::SourceKind;

/// Serves sources from memory, keyed by locator. Any source kind is accepted.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locator: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(locator.into(), content.into());
        self
    }
}

impl SourceProvider for MemorySource {
    async fn fetch(&self, _kind: SourceKind, locator: &str) -> Result<String, FetchError> {
        self.files
            .get(locator)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(locator.to_string()))
    }
}
