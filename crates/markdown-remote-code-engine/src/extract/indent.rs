/// Number of leading spaces and tabs shared by every line that has content.
///
/// Tabs count as one character, same as spaces. Whitespace-only lines do not
/// take part.
pub fn min_indent(text: &str) -> usize {
    text.split('\n')
        .filter_map(|line| {
            let rest = line.trim_start_matches([' ', '\t']);
            match rest.chars().next() {
                Some(c) if !c.is_whitespace() => Some(line.len() - rest.len()),
                _ => None,
            }
        })
        .min()
        .unwrap_or(0)
}

/// Removes the common indentation from every line of `text`.
///
/// Lines with fewer leading spaces/tabs than the common indentation (only
/// possible for whitespace-only lines) are left as they are.
pub fn strip_indent(text: &str) -> String {
    let indent = min_indent(text);
    if indent == 0 {
        return text.to_string();
    }

    text.split('\n')
        .map(|line| {
            let leading = line.bytes().take_while(|b| matches!(b, b' ' | b'\t')).count();
            if leading >= indent {
                &line[indent..]
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_shared_spaces() {
        let text = "    if (true) {\n      while (false)\n        go();\n    }";
        assert_eq!(
            strip_indent(text),
            "if (true) {\n  while (false)\n    go();\n}"
        );
    }

    #[test]
    fn tabs_and_spaces_count_as_one_character_each() {
        assert_eq!(strip_indent("\tone\n  two"), "one\n two");
    }

    #[test]
    fn whitespace_only_lines_do_not_lower_the_minimum() {
        assert_eq!(strip_indent("    a\n\n  \n    b"), "a\n\n  \nb");
        assert_eq!(strip_indent("  a\n      \n  b"), "a\n    \nb");
    }

    #[test]
    fn already_normalized_text_is_unchanged() {
        let text = "fn main() {\n    run();\n}\n";
        assert_eq!(strip_indent(text), text);
        assert_eq!(strip_indent(&strip_indent("  x\n    y")), "x\n  y");
    }

    #[test]
    fn blank_text_is_unchanged() {
        assert_eq!(min_indent(""), 0);
        assert_eq!(min_indent("   \n\t"), 0);
        assert_eq!(strip_indent("   \n\t"), "   \n\t");
    }

    #[test]
    fn trailing_carriage_return_lines_count_as_blank() {
        assert_eq!(min_indent("    a\r\n  \r\n    b"), 4);
    }
}
