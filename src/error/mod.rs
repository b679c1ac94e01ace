//! Error types for parsing and sorting.
//!
//! [`ParseError`] carries the source location of the first fatal problem the
//! parser hit. [`SortError`] is the single error value surfaced by the sorting
//! pipeline; it wraps parse failures, render failures, and failures reading
//! the original byte source.

use std::fmt;
use std::io;

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned when XML parsing fails.
///
/// The parser never recovers: the first well-formedness violation (or a
/// DOCTYPE declaration) aborts parsing and produces this error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}

/// The error returned by every sorting entry point.
///
/// A failing invocation never produces partial output.
#[derive(Debug, thiserror::Error)]
pub enum SortError {
    /// The input is not well-formed XML or contains a DOCTYPE declaration.
    #[error("error sorting XML content: {0}")]
    Parse(#[from] ParseError),

    /// The canonicalized tree could not be serialized.
    #[error("error rendering sorted XML: {message}")]
    Render {
        /// What went wrong.
        message: String,
        /// The underlying writer failure, if any.
        #[source]
        source: Option<io::Error>,
    },

    /// Reading or decoding the original byte source failed.
    #[error("error reading XML input: {0}")]
    Io(#[from] io::Error),
}

impl SortError {
    pub(crate) fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            source: None,
        }
    }
}
