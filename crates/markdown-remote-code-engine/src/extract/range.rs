use crate::directive::LineRange;

/// Lines selected from a source by a [`LineRange`].
///
/// Borrows from the source text; `\r` is kept as ordinary content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContent<'a> {
    lines: Vec<&'a str>,
    trailing_blank: bool,
}

impl<'a> ResolvedContent<'a> {
    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    /// True when the selection ends with the empty segment that follows a
    /// source's final newline, so the emitted text ends in `\n`.
    pub fn keeps_trailing_blank(&self) -> bool {
        self.trailing_blank
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

impl LineRange {
    /// First line selected, 1-indexed.
    pub fn start(&self) -> usize {
        match *self {
            LineRange::None => 1,
            LineRange::Single(from) | LineRange::From(from) | LineRange::Closed(from, _) => from,
        }
    }

    /// Selects lines from `text`, split on `\n`.
    ///
    /// Bounds are never validated: a start past the end or an end before the
    /// start selects nothing.
    pub fn select<'a>(
        &self,
        text: &'a str,
        preserve_trailing_newline: bool,
    ) -> ResolvedContent<'a> {
        let lines: Vec<&'a str> = text.split('\n').collect();
        let ends_with_blank = lines.last() == Some(&"");

        let start = self.start();
        let end = match *self {
            LineRange::Single(_) => start,
            LineRange::Closed(_, to) => to,
            LineRange::From(_) | LineRange::None => {
                if ends_with_blank && !preserve_trailing_newline {
                    lines.len() - 1
                } else {
                    lines.len()
                }
            }
        };

        let first = start.saturating_sub(1);
        let end = end.min(lines.len());
        if first >= end {
            return ResolvedContent {
                lines: Vec::new(),
                trailing_blank: false,
            };
        }

        ResolvedContent {
            trailing_blank: ends_with_blank && end == lines.len(),
            lines: lines[first..end].to_vec(),
        }
    }
}

/// Resolves `range` against `text` and joins the selected lines with `\n`.
pub fn resolve(text: &str, range: LineRange, preserve_trailing_newline: bool) -> String {
    range.select(text, preserve_trailing_newline).to_text()
}
