pub mod directive;
pub mod extract;
pub mod io;
pub mod rewrite;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use directive::{Directive, DirectiveSyntaxError, LineRange, Prefixes, SourceKind};
pub use extract::{ResolvedContent, extract_snippet, resolve, strip_indent};
pub use io::{FetchError, LocalSource, MemorySource, RemoteSource, SourceProvider, Sources};
pub use rewrite::{RewriteError, RewriteOptions, rewrite_document};
