use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

/// The run of backticks or tildes that opens and closes a fenced block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    pub marker: u8,
    pub len: usize,
}

impl Fence {
    pub fn render(&self) -> String {
        char::from(self.marker).to_string().repeat(self.len)
    }

    /// A fence long enough that no line of `lines` can close it early.
    pub fn widened_for(self, lines: &[&str]) -> Fence {
        let longest = lines
            .iter()
            .filter_map(|line| {
                let trimmed = line.trim_start_matches(' ');
                (line.len() - trimmed.len() <= 3)
                    .then(|| trimmed.bytes().take_while(|&b| b == self.marker).count())
            })
            .max()
            .unwrap_or(0);

        if longest >= self.len {
            Fence {
                marker: self.marker,
                len: longest + 1,
            }
        } else {
            self
        }
    }
}

/// A replacement of `range` in the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub text: String,
}

/// A fenced code block located in the original document, with the byte
/// ranges needed to splice a new body in without touching anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// 1-based line of the opening fence.
    pub line: usize,
    /// Info string after the opening fence, trimmed.
    pub info: &'a str,
    pub fence: Fence,
    pub opening_fence: Range<usize>,
    pub closing_fence: Option<Range<usize>>,
    /// Everything between the opening and closing fence lines.
    pub body: Range<usize>,
    /// Container prefix repeated on every body line (`> ` in a block quote,
    /// spaces in a list item).
    pub prefix: String,
    opening_has_newline: bool,
    ends_with_newline: bool,
}

/// Every fenced code block in `source`, in document order.
pub fn fenced_blocks(source: &str) -> Vec<FencedBlock<'_>> {
    Parser::new_ext(source, Options::empty())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => {
                FencedBlock::locate(source, range)
            }
            _ => None,
        })
        .collect()
}

impl<'a> FencedBlock<'a> {
    fn locate(source: &'a str, range: Range<usize>) -> Option<Self> {
        let line_start = source[..range.start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[range.start..]
            .find('\n')
            .map_or(source.len(), |i| range.start + i);
        let opening = &source[line_start..line_end];

        let offset = range.start - line_start;
        let fence_at = offset + opening[offset..].find(['`', '~'])?;
        let marker = opening.as_bytes()[fence_at];
        let len = opening[fence_at..]
            .bytes()
            .take_while(|&b| b == marker)
            .count();
        let fence = Fence { marker, len };

        let opening_has_newline = line_end < source.len();
        let body_start = if opening_has_newline {
            line_end + 1
        } else {
            line_end
        };
        let block_end = range.end.clamp(body_start, source.len());
        let content_end = source[..block_end].trim_end_matches(['\n', '\r']).len();
        let last_line_start = source[..content_end].rfind('\n').map_or(0, |i| i + 1);

        let lead = &opening[..fence_at];
        let containers = containers(lead);
        let closing = (last_line_start >= body_start)
            .then(|| closing_fence(&source[last_line_start..content_end], fence, &containers))
            .flatten();
        let (body, closing_fence) = match closing {
            Some(run) => (
                body_start..last_line_start,
                Some(last_line_start + run.start..last_line_start + run.end),
            ),
            None => (body_start..block_end, None),
        };

        Some(Self {
            line: source[..line_start].matches('\n').count() + 1,
            info: opening[fence_at + len..].trim(),
            fence,
            opening_fence: line_start + fence_at..line_start + fence_at + len,
            closing_fence,
            body,
            prefix: continuation_prefix(lead),
            opening_has_newline,
            ends_with_newline: source[..block_end].ends_with('\n'),
        })
    }

    pub fn language(&self) -> Option<&'a str> {
        self.info.split_whitespace().next()
    }

    /// The info string after the language word, if any.
    pub fn meta(&self) -> Option<&'a str> {
        let (_, meta) = self.info.split_once(char::is_whitespace)?;
        let meta = meta.trim_start();
        (!meta.is_empty()).then_some(meta)
    }

    pub fn is_closed(&self) -> bool {
        self.closing_fence.is_some()
    }

    /// Edits that replace this block's body with `content`.
    pub fn edits(&self, content: &str) -> Vec<Edit> {
        let lines: Vec<&str> = if content.is_empty() {
            Vec::new()
        } else {
            content.split('\n').collect()
        };
        let fence = self.fence.widened_for(&lines);

        let mut body = String::new();
        if !self.opening_has_newline {
            body.push('\n');
        }
        for line in &lines {
            if line.is_empty() {
                body.push_str(self.prefix.trim_end());
            } else {
                body.push_str(&self.prefix);
                body.push_str(line);
            }
            body.push('\n');
        }
        if !self.is_closed() {
            body.push_str(&self.prefix);
            body.push_str(&fence.render());
            if self.ends_with_newline {
                body.push('\n');
            }
        }

        let mut edits = vec![Edit {
            range: self.body.clone(),
            text: body,
        }];
        if fence != self.fence {
            edits.push(Edit {
                range: self.opening_fence.clone(),
                text: fence.render(),
            });
            if let Some(closing) = &self.closing_fence {
                edits.push(Edit {
                    range: closing.clone(),
                    text: fence.render(),
                });
            }
        }
        edits
    }
}

/// One level of container nesting in front of an opening fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Quote,
    /// Content column of a list item, relative to the enclosing container.
    Indent(usize),
}

/// Block quote markers and list items in `lead`, outermost first. Whatever
/// follows them is the fence's own indentation.
fn containers(lead: &str) -> Vec<Container> {
    let bytes = lead.as_bytes();
    let mut containers = Vec::new();
    let mut i = 0;
    loop {
        let spaces = count_spaces(&bytes[i..]);
        let at = i + spaces;
        let marker_len = match bytes.get(at) {
            Some(b'>') => {
                containers.push(Container::Quote);
                i = at + 1;
                if bytes.get(i) == Some(&b' ') {
                    i += 1;
                }
                continue;
            }
            Some(b'-' | b'*' | b'+') => 1,
            Some(b'0'..=b'9') => {
                let digits = bytes[at..].iter().take_while(|b| b.is_ascii_digit()).count();
                match bytes.get(at + digits) {
                    Some(b'.' | b')') if digits <= 9 => digits + 1,
                    _ => return containers,
                }
            }
            _ => return containers,
        };

        let gap = count_spaces(&bytes[at + marker_len..]);
        if gap == 0 {
            return containers;
        }
        containers.push(Container::Indent(spaces + marker_len + gap));
        i = at + marker_len + gap;
    }
}

fn count_spaces(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|&&b| b == b' ').count()
}

/// Span of the fence run in `line` when it closes a block opened by `fence`
/// inside `containers`. The run may be indented by at most three spaces
/// past the containers.
fn closing_fence(line: &str, fence: Fence, containers: &[Container]) -> Option<Range<usize>> {
    let bytes = line.as_bytes();
    let mut i = 0;
    for container in containers {
        match *container {
            Container::Quote => {
                let at = i + count_spaces(&bytes[i..]).min(3);
                if bytes.get(at) != Some(&b'>') {
                    return None;
                }
                i = at + 1;
                if bytes.get(i) == Some(&b' ') {
                    i += 1;
                }
            }
            Container::Indent(width) => {
                if count_spaces(&bytes[i..]) < width {
                    return None;
                }
                i += width;
            }
        }
    }

    let indent = count_spaces(&bytes[i..]);
    if indent > 3 {
        return None;
    }
    let at = i + indent;
    let run = bytes[at..].iter().take_while(|&&b| b == fence.marker).count();
    (run >= fence.len && line[at + run..].trim().is_empty()).then_some(at..at + run)
}

/// Block quote markers are kept, everything else becomes spaces.
fn continuation_prefix(lead: &str) -> String {
    lead.chars()
        .map(|c| if matches!(c, '>' | '\t') { c } else { ' ' })
        .collect()
}

/// Applies non-overlapping edits to `source`.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| (b.range.start, b.range.end).cmp(&(a.range.start, a.range.end)));
    let mut out = source.to_string();
    for edit in edits {
        out.replace_range(edit.range, &edit.text);
    }
    out
}
