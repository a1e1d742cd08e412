// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Frontend errors and their rendering.

use std::cmp::min;

use cstep_core::LineIndex;
use thiserror::Error;

use crate::tree::Location;

/// Failure to obtain a parse tree for a translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The built-in frontend rejected the source text.
    #[error("{message} at {}:{}", start.line, start.column)]
    Syntax {
        message: String,
        start: Location,
        end: Location,
    },

    /// An externally produced tree is malformed.
    #[error("invalid parse tree: {message}")]
    InvalidTree { message: String },
}

impl ParseError {
    pub(crate) fn syntax(message: impl Into<String>, start: Location, end: Location) -> Self {
        ParseError::Syntax {
            message: message.into(),
            start,
            end,
        }
    }

    pub(crate) fn invalid_tree(message: impl Into<String>) -> Self {
        ParseError::InvalidTree {
            message: message.into(),
        }
    }

    /// Start of the offending range, for errors that have one.
    pub fn location(&self) -> Option<Location> {
        match self {
            ParseError::Syntax { start, .. } => Some(*start),
            ParseError::InvalidTree { .. } => None,
        }
    }

    /// The bare message, without location.
    pub fn message(&self) -> &str {
        match self {
            ParseError::Syntax { message, .. } | ParseError::InvalidTree { message } => message,
        }
    }
}

/// Formats a parse error into a human-readable string with source context.
///
/// One line of context is shown on each side of the offending range.
pub fn prettify_error(err: &ParseError, source: &str, label: &str) -> String {
    match err {
        ParseError::Syntax {
            message,
            start,
            end,
        } => {
            use annotate_snippets::{Level, Renderer, Snippet};

            let index = LineIndex::new(source);
            let context = 1;
            let first_line = start.line.saturating_sub(context).max(1);
            let last_line = (end.line + context + 1).min(index.line_count() as u32 + 1);
            let window_start = index.offset(first_line, 1).unwrap_or(0);
            let window_end = index.offset(last_line, 1).unwrap_or(source.len());
            let snippet = &source[window_start..window_end];
            let span_start = index
                .offset(start.line, start.column)
                .unwrap_or(window_start)
                .saturating_sub(window_start);
            let span_end = index
                .offset(end.line, end.column)
                .unwrap_or(window_end)
                .saturating_sub(window_start);
            let span_end = if span_end <= span_start {
                min(span_start + 1, snippet.len())
            } else {
                span_end
            };
            let span_start = min(span_start, span_end);
            Renderer::plain()
                .render(
                    Level::Error.title(label).snippet(
                        Snippet::source(snippet)
                            .line_start(first_line as usize)
                            .fold(false)
                            .annotations(vec![Level::Error
                                .span(span_start..span_end)
                                .label(message)]),
                    ),
                )
                .to_string()
        }
        e => format!("Parse error for {}: {}", label, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display_names_position() {
        let err = ParseError::syntax("expected ';'", Location::new(2, 7), Location::new(2, 8));
        assert_eq!(err.to_string(), "expected ';' at 2:7");
        assert_eq!(err.location(), Some(Location::new(2, 7)));
    }

    #[test]
    fn prettify_includes_label_and_source_line() {
        let source = "int main() {\n  return 0\n}\n";
        let err = ParseError::syntax("expected ';'", Location::new(2, 11), Location::new(2, 11));
        let text = prettify_error(&err, source, "main.c");
        assert!(text.contains("main.c"), "{}", text);
        assert!(text.contains("return 0"), "{}", text);
        assert!(text.contains("expected ';'"), "{}", text);
    }

    #[test]
    fn prettify_invalid_tree_is_one_line() {
        let err = ParseError::invalid_tree("root out of range");
        assert_eq!(
            prettify_error(&err, "", "t.json"),
            "Parse error for t.json: invalid parse tree: root out of range"
        );
    }
}
