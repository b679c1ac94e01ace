//! Namespace-aware XML 1.0 parser.
//!
//! A hand-rolled recursive descent parser that builds a [`Document`] tree for
//! the sorter. It is strict: the first well-formedness violation aborts the
//! parse, there is no recovery mode.
//!
//! # Security
//!
//! Document type declarations are rejected outright. With no DTD there are no
//! general entities besides the five predefined ones, so external entity
//! expansion (XXE) and entity-expansion bombs cannot happen. Nesting depth,
//! attribute count, and name length are bounded by [`ParseOptions`].

pub(crate) mod input;
mod xml;

use crate::error::ParseError;
use crate::tree::Document;

use input::{DEFAULT_MAX_ATTRIBUTES, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NAME_LENGTH};

/// Parse options controlling parser security limits.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use xmlsorter::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .max_depth(128)
///     .max_attributes(64);
/// assert_eq!(opts.max_depth, 128);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum element nesting depth (default: 256).
    ///
    /// The sorter recurses once per nesting level, so this also bounds its
    /// stack usage.
    pub max_depth: u32,
    /// Maximum number of attributes on a single element (default: 256).
    pub max_attributes: u32,
    /// Maximum length in bytes of an element or attribute name (default: 50,000).
    pub max_name_length: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl ParseOptions {
    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum number of attributes per element.
    #[must_use]
    pub fn max_attributes(mut self, max: u32) -> Self {
        self.max_attributes = max;
        self
    }

    /// Sets the maximum element/attribute name length in bytes.
    #[must_use]
    pub fn max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }
}

/// Parses an XML string with default options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed XML or contains a
/// DOCTYPE declaration.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    parse_str_with_options(input, &ParseOptions::default())
}

/// Parses an XML string with the given options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed XML, contains a
/// DOCTYPE declaration, or exceeds one of the configured limits.
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    let mut parser = xml::XmlParser::new(input, options);
    parser.parse()
}
