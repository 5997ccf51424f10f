use std::ops::Range;

use super::LineRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum FragmentError {
    /// `#-L2`: an end line with no start line.
    MissingStart,
    Malformed,
}

/// Position of the fragment state machine after consuming a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    FromMarker,
    FromDigits,
    Dash,
    ToMarker,
    ToDigits,
}

/// Parses the text after `#`.
///
/// Returns `Ok(None)` when the fragment is not a line range at all (an anchor
/// such as `#intro`), in which case it belongs to the locator.
pub(super) fn parse_fragment(fragment: &str) -> Result<Option<LineRange>, FragmentError> {
    let bytes = fragment.as_bytes();
    match bytes {
        [] => return Ok(Some(LineRange::From(1))),
        [b'-', ..] => return Err(FragmentError::MissingStart),
        [b'L', digit, ..] if digit.is_ascii_digit() => {}
        _ => return Ok(None),
    }

    let mut state = State::Start;
    let mut from: Range<usize> = 0..0;
    let mut to: Range<usize> = 0..0;

    for (i, &b) in bytes.iter().enumerate() {
        state = match (state, b) {
            (State::Start, b'L') => State::FromMarker,
            (State::FromMarker, b'0'..=b'9') => {
                from = i..i + 1;
                State::FromDigits
            }
            (State::FromDigits, b'0'..=b'9') => {
                from.end = i + 1;
                State::FromDigits
            }
            (State::FromDigits, b'-') => State::Dash,
            (State::Dash, b'L') => State::ToMarker,
            (State::ToMarker, b'0'..=b'9') => {
                to = i..i + 1;
                State::ToDigits
            }
            (State::ToDigits, b'0'..=b'9') => {
                to.end = i + 1;
                State::ToDigits
            }
            _ => return Err(FragmentError::Malformed),
        };
    }

    // A zero start counts from the first line; a zero end leaves the range open.
    let range = match state {
        State::FromDigits => LineRange::Single(line_number(&fragment[from]).max(1)),
        State::Dash => LineRange::From(line_number(&fragment[from]).max(1)),
        State::ToDigits => {
            let start = line_number(&fragment[from]).max(1);
            match line_number(&fragment[to]) {
                0 => LineRange::From(start),
                end => LineRange::Closed(start, end),
            }
        }
        State::Start | State::FromMarker | State::ToMarker => return Err(FragmentError::Malformed),
    };
    Ok(Some(range))
}

/// Digits only reach here, so the one parse failure is overflow, which
/// saturates to a line past any source.
fn line_number(digits: &str) -> usize {
    digits.parse().unwrap_or(usize::MAX)
}
