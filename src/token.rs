//! The token definition for the saved-view query language.

use std::fmt;

/// A token is one whitespace-delimited unit of a query, with its location.
///
/// The text is borrowed verbatim from the input, so grouping delimiters
/// (`(`, `)`, `"`) are still present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(text: &'a str, start: usize) -> Self {
        Self {
            text,
            span: Span::new(start, start + text.len()),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
