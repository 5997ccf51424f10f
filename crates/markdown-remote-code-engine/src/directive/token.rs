use super::Prefixes;

/// Iterator over the space-separated tokens of a code block's metadata.
///
/// A space preceded by a backslash (`\ `) does not separate tokens; the
/// escape is left in place for the directive parser to undo.
#[derive(Debug, Clone)]
pub struct MetaTokens<'a> {
    rest: Option<&'a str>,
}

impl<'a> Iterator for MetaTokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        let bytes = rest.as_bytes();
        let split_at =
            (0..bytes.len()).find(|&i| bytes[i] == b' ' && (i == 0 || bytes[i - 1] != b'\\'));

        match split_at {
            Some(i) => {
                self.rest = Some(&rest[i + 1..]);
                Some(&rest[..i])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// Splits metadata on unescaped spaces.
pub fn split_meta(meta: &str) -> MetaTokens<'_> {
    MetaTokens { rest: Some(meta) }
}

/// Returns the first metadata token that starts with a recognized `prefix=`.
pub fn find_directive_token<'a>(meta: &'a str, prefixes: &Prefixes) -> Option<&'a str> {
    split_meta(meta).find(|token| prefixes.strip(token).is_some())
}

/// Splits a locator from the fragment after its last `#`.
pub(super) fn split_fragment(rest: &str) -> Option<(&str, &str)> {
    rest.rsplit_once('#')
}
