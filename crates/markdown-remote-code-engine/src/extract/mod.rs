//! Turning fetched source text into the body of a code block.

mod indent;
mod range;

pub use indent::{min_indent, strip_indent};
pub use range::{ResolvedContent, resolve};

use crate::directive::LineRange;

/// Applies the line range and, when asked, removes redundant indentation.
pub fn extract_snippet(
    text: &str,
    range: LineRange,
    preserve_trailing_newline: bool,
    remove_redundant_indentations: bool,
) -> String {
    let snippet = resolve(text, range, preserve_trailing_newline);
    if remove_redundant_indentations {
        strip_indent(&snippet)
    } else {
        snippet
    }
}
