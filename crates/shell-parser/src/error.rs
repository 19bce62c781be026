// Parse error types with source context for diagnostics.
// The miette Diagnostic derive generates code that triggers unused_assignments
// false positives on struct fields.
#![allow(unused_assignments)]

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A shell syntax error, located by byte offset and 1-based line/column.
#[derive(Debug, Error, Diagnostic)]
#[error("{line}:{column}: {message}")]
#[diagnostic(code(bash_scanner::parse))]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: SourceSpan,
}

impl ParseError {
    pub(crate) fn new(raw: SyntaxError, source: &str) -> Self {
        let offset = raw.offset.min(source.len());
        let (line, column) = offset_to_line_col(source, offset);
        Self {
            message: raw.message,
            line,
            column,
            src: NamedSource::new("command", source.to_string()),
            span: SourceSpan::from((offset, 0)),
        }
    }

    /// Byte offset of the error in the parsed input.
    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}

/// Error produced by the lexer or parser before source context is attached.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SyntaxError {
    pub(crate) message: String,
    pub(crate) offset: usize,
}

impl SyntaxError {
    pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Convert a byte offset in source text to a 1-based (line, column) pair.
pub fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..floor_char_boundary(source, offset)];
    let line = before.bytes().filter(|&b| b == b'\n').count() + 1;
    let col = before
        .rfind('\n')
        .map_or(before.chars().count(), |p| before[p + 1..].chars().count())
        + 1;
    (line, col)
}

fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut idx = offset.min(source.len());
    while !source.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
