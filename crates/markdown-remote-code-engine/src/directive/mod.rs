//! Parsing of the source directive carried in a fenced code block's metadata.
//!
//! A directive looks like `url=https://host/file.rs#L3-L7` or
//! `file=<rootDir>/src/lib.rs#L10-`. Parsing happens in two steps: the
//! tokenizer in [`token`] isolates the directive token and splits the locator
//! from its fragment, then the state machine in [`fragment`] turns the
//! fragment into a [`LineRange`].

mod fragment;
mod token;

use thiserror::Error;

use fragment::{FragmentError, parse_fragment};
pub use token::{MetaTokens, find_directive_token, split_meta};

/// Placeholder substituted with the configured root directory.
pub const ROOT_DIR_PLACEHOLDER: &str = "<rootDir>";

/// Where a directive's content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A network-addressable resource, fetched over HTTP.
    Remote,
    /// A file on the local filesystem.
    Local,
}

/// Line selection attached to a directive. Line numbers are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineRange {
    /// The whole source.
    #[default]
    None,
    /// Exactly one line.
    Single(usize),
    /// From a line through the end of the source.
    From(usize),
    /// From the first line through the second, inclusive.
    Closed(usize, usize),
}

/// A parsed directive: which source to fetch and which lines to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: SourceKind,
    pub locator: String,
    pub range: LineRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveSyntaxError {
    #[error("Unable to parse file path {token}")]
    Unrecognized { token: String },

    #[error("Directive {token} has an empty path")]
    EmptyLocator { token: String },

    #[error("Line range #{fragment} in {token} has an end line but no start line")]
    MissingStart { token: String, fragment: String },

    #[error("Malformed line range #{fragment} in {token}")]
    MalformedRange { token: String, fragment: String },
}

/// The keywords recognized in front of `=` and the source kind each selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefixes {
    entries: Vec<(String, SourceKind)>,
}

impl Default for Prefixes {
    fn default() -> Self {
        Self::empty()
            .with("url", SourceKind::Remote)
            .with("file", SourceKind::Local)
    }
}

impl Prefixes {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers `keyword`, replacing any earlier mapping for it.
    pub fn with(mut self, keyword: impl Into<String>, kind: SourceKind) -> Self {
        let keyword = keyword.into();
        self.entries.retain(|(existing, _)| *existing != keyword);
        self.entries.push((keyword, kind));
        self
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(keyword, _)| keyword.as_str())
    }

    /// Splits `keyword=` off the front of `token`.
    pub fn strip<'t>(&self, token: &'t str) -> Option<(SourceKind, &'t str)> {
        self.entries.iter().find_map(|(keyword, kind)| {
            token
                .strip_prefix(keyword.as_str())
                .and_then(|rest| rest.strip_prefix('='))
                .map(|rest| (*kind, rest))
        })
    }
}

impl Directive {
    /// Parses a directive token using the default `url`/`file` prefixes.
    pub fn parse(token: &str, root_dir: &str) -> Result<Self, DirectiveSyntaxError> {
        Self::parse_with(token, root_dir, &Prefixes::default())
    }

    pub fn parse_with(
        token: &str,
        root_dir: &str,
        prefixes: &Prefixes,
    ) -> Result<Self, DirectiveSyntaxError> {
        let (kind, rest) =
            prefixes
                .strip(token)
                .ok_or_else(|| DirectiveSyntaxError::Unrecognized {
                    token: token.to_string(),
                })?;

        let (path, range) = split_range(token, rest)?;
        if path.is_empty() {
            return Err(DirectiveSyntaxError::EmptyLocator {
                token: token.to_string(),
            });
        }

        Ok(Self {
            kind,
            locator: normalize_locator(path, root_dir),
            range,
        })
    }
}

/// Splits `rest` at its last `#`. A fragment that is not a line range stays
/// part of the path.
fn split_range<'t>(
    token: &str,
    rest: &'t str,
) -> Result<(&'t str, LineRange), DirectiveSyntaxError> {
    let Some((path, fragment)) = token::split_fragment(rest) else {
        return Ok((rest, LineRange::None));
    };

    match parse_fragment(fragment) {
        Ok(Some(range)) => Ok((path, range)),
        Ok(None) => Ok((rest, LineRange::None)),
        Err(FragmentError::MissingStart) => Err(DirectiveSyntaxError::MissingStart {
            token: token.to_string(),
            fragment: fragment.to_string(),
        }),
        Err(FragmentError::Malformed) => Err(DirectiveSyntaxError::MalformedRange {
            token: token.to_string(),
            fragment: fragment.to_string(),
        }),
    }
}

/// Substitutes a leading `<rootDir>`, then unescapes `\ ` to a space.
fn normalize_locator(path: &str, root_dir: &str) -> String {
    let substituted = match path.strip_prefix(ROOT_DIR_PLACEHOLDER) {
        Some(rest) => format!("{root_dir}{rest}"),
        None => path.to_string(),
    };
    substituted.replace("\\ ", " ")
}
