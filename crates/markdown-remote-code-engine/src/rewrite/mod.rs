//! Rewriting the fenced code blocks of a Markdown document.
//!
//! Every fenced block whose metadata carries a directive gets its body
//! replaced by the snippet the directive points at. The document is never
//! re-serialized: blocks are located with `pulldown-cmark` and their bodies
//! are spliced into the original text, so bytes outside rewritten bodies stay
//! exactly as they were.
//!
//! All directives are parsed before anything is fetched. Fetches then run
//! concurrently on the current task and are joined; the document is rewritten
//! only if every one of them succeeded.

mod blocks;

pub use blocks::{Edit, Fence, FencedBlock, apply_edits, fenced_blocks};

use futures::future::join_all;
use log::debug;
use thiserror::Error;

use crate::directive::{Directive, DirectiveSyntaxError, Prefixes, find_directive_token};
use crate::extract::extract_snippet;
use crate::io::{FetchError, SourceProvider};

#[derive(Debug, Clone, Default)]
pub struct RewriteOptions {
    /// Keep the blank line a source's final newline produces in whole-file
    /// and open-ended extractions.
    pub preserve_trailing_newline: bool,
    pub remove_redundant_indentations: bool,
    /// Substituted for a leading `<rootDir>` in locators.
    pub root_dir: String,
    pub prefixes: Prefixes,
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Code block at line {line}: {source}")]
    Directive {
        line: usize,
        #[source]
        source: DirectiveSyntaxError,
    },
    #[error("Code block at line {line}: {source}")]
    Fetch {
        line: usize,
        #[source]
        source: FetchError,
    },
}

impl RewriteError {
    /// Line of the opening fence of the block that failed.
    pub fn line(&self) -> usize {
        match self {
            RewriteError::Directive { line, .. } | RewriteError::Fetch { line, .. } => *line,
        }
    }
}

/// A block that carries a directive, waiting for its content.
#[derive(Debug)]
struct PendingBlock<'a> {
    block: FencedBlock<'a>,
    directive: Directive,
}

/// Rewrites every directive-carrying code block in `source`.
///
/// Fails with the first error in document order once all fetches settled.
pub async fn rewrite_document<P: SourceProvider>(
    source: &str,
    provider: &P,
    options: &RewriteOptions,
) -> Result<String, RewriteError> {
    let pending = collect_directives(source, options)?;
    if pending.is_empty() {
        return Ok(source.to_string());
    }
    debug!("Resolving {} code block(s)", pending.len());

    let results = join_all(
        pending
            .iter()
            .map(|block| resolve_block(block, provider, options)),
    )
    .await;

    let mut edits = Vec::new();
    for (pending, content) in pending.iter().zip(results) {
        edits.extend(pending.block.edits(&content?));
    }
    Ok(apply_edits(source, edits))
}

fn collect_directives<'a>(
    source: &'a str,
    options: &RewriteOptions,
) -> Result<Vec<PendingBlock<'a>>, RewriteError> {
    fenced_blocks(source)
        .into_iter()
        .filter_map(|block| {
            let token = find_directive_token(block.meta()?, &options.prefixes)?;
            debug!("Found directive {token} at line {}", block.line);
            Some(
                match Directive::parse_with(token, &options.root_dir, &options.prefixes) {
                    Ok(directive) => Ok(PendingBlock { block, directive }),
                    Err(source) => Err(RewriteError::Directive {
                        line: block.line,
                        source,
                    }),
                },
            )
        })
        .collect()
}

async fn resolve_block<P: SourceProvider>(
    pending: &PendingBlock<'_>,
    provider: &P,
    options: &RewriteOptions,
) -> Result<String, RewriteError> {
    let Directive {
        kind,
        locator,
        range,
    } = &pending.directive;

    let text = provider
        .fetch(*kind, locator)
        .await
        .map_err(|source| RewriteError::Fetch {
            line: pending.block.line,
            source,
        })?;
    debug!("Fetched {} bytes from {locator}", text.len());

    Ok(extract_snippet(
        &text,
        *range,
        options.preserve_trailing_newline,
        options.remove_redundant_indentations,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::SourceKind;
    use crate::io::MemorySource;
    use pretty_assertions::assert_eq;

    const SAY_HI: &str = "console.log('Hello remark-remote-code!');\nconsole.log('This is another line...');\nconsole.log('This is the last line');\nconsole.log('Oops, here is another');\n";

    fn provider() -> MemorySource {
        MemorySource::new()
            .with("https://example.com/say-hi.js", SAY_HI)
            .with(
                "https://example.com/indentation.js",
                "function f() {\n  console.log('indentation');\n\treturn 'indentation';\n}\n\nfunction g() {\n    if (true) {\n      while (false)\n        console.log('nested');\n    }\n}\n",
            )
            .with("https://example.com/filename with spaces.js", "console.log('filename with spaces');\n")
    }

    async fn run(markdown: &str, options: &RewriteOptions) -> Result<String, RewriteError> {
        rewrite_document(markdown, &provider(), options).await
    }

    #[tokio::test]
    async fn imports_whole_file() {
        let out = run(
            "```js url=https://example.com/say-hi.js\n```\n",
            &RewriteOptions::default(),
        )
        .await
        .unwrap();
        insta::assert_snapshot!(out.trim_end(), @r"
        ```js url=https://example.com/say-hi.js
        console.log('Hello remark-remote-code!');
        console.log('This is another line...');
        console.log('This is the last line');
        console.log('Oops, here is another');
        ```
        ");
    }

    #[tokio::test]
    async fn imports_line_ranges() {
        let options = RewriteOptions::default();
        let cases = [
            (
                "#L2-L3",
                "console.log('This is another line...');\nconsole.log('This is the last line');",
            ),
            ("#L1", "console.log('Hello remark-remote-code!');"),
            (
                "#L2-",
                "console.log('This is another line...');\nconsole.log('This is the last line');\nconsole.log('Oops, here is another');",
            ),
        ];

        for (fragment, expected) in cases {
            let markdown = format!("```js url=https://example.com/say-hi.js{fragment}\n```\n");
            let out = run(&markdown, &options).await.unwrap();
            assert_eq!(
                out,
                format!("```js url=https://example.com/say-hi.js{fragment}\n{expected}\n```\n")
            );
        }
    }

    #[tokio::test]
    async fn preserves_trailing_newline_on_request() {
        let options = RewriteOptions {
            preserve_trailing_newline: true,
            ..Default::default()
        };
        let out = run("```js url=https://example.com/say-hi.js\n```\n", &options)
            .await
            .unwrap();
        assert_eq!(
            out,
            format!("```js url=https://example.com/say-hi.js\n{SAY_HI}\n```\n")
        );
    }

    #[tokio::test]
    async fn keeps_indentation_by_default() {
        let out = run(
            "```js url=https://example.com/indentation.js#L2-L3\n```\n",
            &RewriteOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            out,
            "```js url=https://example.com/indentation.js#L2-L3\n  console.log('indentation');\n\treturn 'indentation';\n```\n"
        );
    }

    #[tokio::test]
    async fn removes_redundant_indentations() {
        let options = RewriteOptions {
            remove_redundant_indentations: true,
            ..Default::default()
        };
        let out = run(
            "```js url=https://example.com/indentation.js#L7-L10\n```\n",
            &options,
        )
        .await
        .unwrap();
        insta::assert_snapshot!(out.trim_end(), @r"
        ```js url=https://example.com/indentation.js#L7-L10
        if (true) {
          while (false)
            console.log('nested');
        }
        ```
        ");
    }

    #[tokio::test]
    async fn allows_escaped_spaces_in_paths() {
        let markdown = "```js url=https://example.com/filename\\ with\\ spaces.js\n```\n";
        let out = run(markdown, &RewriteOptions::default()).await.unwrap();
        assert_eq!(
            out,
            "```js url=https://example.com/filename\\ with\\ spaces.js\nconsole.log('filename with spaces');\n```\n"
        );
    }

    #[tokio::test]
    async fn substitutes_root_dir() {
        let options = RewriteOptions {
            root_dir: "https://example.com".to_string(),
            ..Default::default()
        };
        let out = run("```js url=<rootDir>/say-hi.js#L1\n```\n", &options)
            .await
            .unwrap();
        assert_eq!(
            out,
            "```js url=<rootDir>/say-hi.js#L1\nconsole.log('Hello remark-remote-code!');\n```\n"
        );
    }

    #[tokio::test]
    async fn leaves_blocks_without_directive_untouched() {
        let markdown = "```js title=x\nkeep();\n```\n\n```url=https://example.com/say-hi.js\nkeep();\n```\n\n    indented url=x\n";
        let out = run(markdown, &RewriteOptions::default()).await.unwrap();
        assert_eq!(out, markdown);
    }

    #[tokio::test]
    async fn rewriting_is_idempotent() {
        let markdown = "Intro\n\n```js url=https://example.com/say-hi.js#L1-L2\n```\n";
        let once = run(markdown, &RewriteOptions::default()).await.unwrap();
        let twice = run(&once, &RewriteOptions::default()).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn one_failed_fetch_fails_the_document() {
        let markdown = "```js url=https://example.com/say-hi.js\n```\n\n```js url=https://example.com/missing.js\n```\n\n```js url=https://example.com/say-hi.js#L1\n```\n";
        let err = run(markdown, &RewriteOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.line(), 4);
        assert!(matches!(
            err,
            RewriteError::Fetch {
                source: FetchError::NotFound(_),
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "Code block at line 4: Source not found: https://example.com/missing.js"
        );
    }

    #[tokio::test]
    async fn malformed_directive_fails_before_fetching() {
        let markdown = "```js url=https://example.com/say-hi.js\n```\n\n```js url=https://example.com/say-hi.js#-L2\n```\n";
        let err = run(markdown, &RewriteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RewriteError::Directive {
                line: 4,
                source: DirectiveSyntaxError::MissingStart { .. },
            }
        ));
    }

    #[tokio::test]
    async fn custom_prefixes_select_the_source_kind() {
        let options = RewriteOptions {
            prefixes: Prefixes::empty().with("snippet", SourceKind::Local),
            ..Default::default()
        };
        let out = run(
            "```js url=x snippet=https://example.com/say-hi.js#L4\n```\n",
            &options,
        )
        .await
        .unwrap();
        assert_eq!(
            out,
            "```js url=x snippet=https://example.com/say-hi.js#L4\nconsole.log('Oops, here is another');\n```\n"
        );
    }

    fn code_block_text(markdown: &str) -> String {
        use pulldown_cmark::{Event, Parser, Tag, TagEnd};

        let mut inside = false;
        let mut text = String::new();
        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::CodeBlock(_)) => inside = true,
                Event::End(TagEnd::CodeBlock) => inside = false,
                Event::Text(chunk) if inside => text.push_str(&chunk),
                _ => {}
            }
        }
        text
    }

    #[tokio::test]
    async fn over_indented_fence_in_unclosed_block_is_replaced() {
        let out = run(
            "```js url=https://example.com/say-hi.js#L1\n    ```\n",
            &RewriteOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            code_block_text(&out),
            "console.log('Hello remark-remote-code!');\n"
        );
    }

    #[tokio::test]
    async fn zero_and_huge_line_numbers_are_not_errors() {
        let options = RewriteOptions::default();
        let cases = [
            ("#L0", "console.log('Hello remark-remote-code!');\n"),
            ("#L4-L0", "console.log('Oops, here is another');\n"),
            ("#L99999999999999999999999", ""),
        ];
        for (fragment, expected) in cases {
            let markdown = format!("```js url=https://example.com/say-hi.js{fragment}\n```\n");
            let out = run(&markdown, &options).await.unwrap();
            assert_eq!(code_block_text(&out), expected, "fragment {fragment}");
        }
    }
}
