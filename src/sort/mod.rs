//! The sorting pipeline.
//!
//! [`XmlSorter`] runs input text through a fixed sequence of stages:
//!
//! 1. strip the XML declaration ([`Prologue::strip`]);
//! 2. parse the remaining text;
//! 3. canonicalize the tree from its root element ([`canonicalize`]);
//! 4. render the tree ([`crate::serial::render`]);
//! 5. reattach the declaration ([`Prologue::reattach`]).
//!
//! The first failing stage aborts the run and nothing is returned but the
//! error. The declaration is passed from stage 1 to stage 5 as a local value,
//! so a single sorter can serve any number of threads at once.

mod canonicalize;
mod compare;
mod prologue;

pub use canonicalize::canonicalize;
pub use compare::{compare_attributes, compare_elements, text_content};
pub use prologue::{Declaration, Prologue};

pub use crate::error::SortError;

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use log::{debug, log_enabled, Level};

use crate::encoding::decode_to_utf8;
use crate::parser::{parse_str_with_options, ParseOptions};
use crate::serial::{render, RenderOptions};
use crate::tree::Document;

/// Canonicalizes XML documents.
///
/// A sorter holds only its options and is never mutated after construction.
///
/// # Examples
///
/// ```
/// use xmlsorter::XmlSorter;
///
/// let sorter = XmlSorter::new();
/// let out = sorter.sort_str(r#"<r><b/><a y="2" x="1"/></r>"#).unwrap();
/// assert_eq!(out, "<r>\n    <a x=\"1\" y=\"2\"/>\n    <b/>\n</r>\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct XmlSorter {
    parse_options: ParseOptions,
    render_options: RenderOptions,
}

impl XmlSorter {
    /// Creates a sorter with default parse and render options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sorter with explicit options.
    #[must_use]
    pub fn with_options(parse_options: ParseOptions, render_options: RenderOptions) -> Self {
        Self {
            parse_options,
            render_options,
        }
    }

    /// Returns the parse options.
    #[must_use]
    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse_options
    }

    /// Returns the render options.
    #[must_use]
    pub fn render_options(&self) -> &RenderOptions {
        &self.render_options
    }

    /// Sorts an XML document given as text.
    ///
    /// # Errors
    ///
    /// Returns [`SortError::Parse`] for malformed input or a DOCTYPE, and
    /// [`SortError::Render`] if the tree cannot be rendered.
    pub fn sort_str(&self, text: &str) -> Result<String, SortError> {
        let (declaration, body) = Prologue::strip(text);
        if let Some(decl) = &declaration {
            debug!("captured XML declaration {decl}");
        }

        let mut doc = parse_str_with_options(body, &self.parse_options)?;
        let rendered = self.canonicalize_and_render(&mut doc)?;
        Ok(Prologue::reattach(declaration.as_ref(), &doc, &rendered))
    }

    /// Sorts an already parsed document in place and renders it.
    ///
    /// No declaration text is available here, so one is emitted only when
    /// the document metadata carries an encoding.
    ///
    /// # Errors
    ///
    /// Returns [`SortError::Render`] if the document has no root element.
    pub fn sort_document(&self, doc: &mut Document) -> Result<String, SortError> {
        let rendered = self.canonicalize_and_render(doc)?;
        Ok(Prologue::reattach(None, doc, &rendered))
    }

    /// Decodes a byte source and sorts it.
    ///
    /// A byte order mark or an `encoding` in the declaration selects the
    /// character encoding; the default is UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`SortError::Io`] with kind `InvalidData` if the bytes cannot
    /// be decoded, otherwise as [`sort_str`](Self::sort_str).
    pub fn sort_bytes(&self, bytes: &[u8]) -> Result<String, SortError> {
        let text =
            decode_to_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.sort_str(&text)
    }

    /// Reads a stream to its end and sorts its content.
    ///
    /// # Errors
    ///
    /// Returns [`SortError::Io`] if reading fails, otherwise as
    /// [`sort_bytes`](Self::sort_bytes).
    pub fn sort_reader<R: Read>(&self, mut reader: R) -> Result<String, SortError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.sort_bytes(&bytes)
    }

    /// Sorts the content of a file.
    ///
    /// # Errors
    ///
    /// Returns [`SortError::Io`] if the file cannot be opened or read,
    /// otherwise as [`sort_bytes`](Self::sort_bytes).
    pub fn sort_file(&self, path: impl AsRef<Path>) -> Result<String, SortError> {
        let path = path.as_ref();
        debug!("sorting {}", path.display());
        self.sort_reader(File::open(path)?)
    }

    fn canonicalize_and_render(&self, doc: &mut Document) -> Result<String, SortError> {
        let root = doc
            .root_element()
            .ok_or_else(|| SortError::render("document has no root element"))?;
        if log_enabled!(Level::Debug) {
            let before = doc.descendants(root).count();
            canonicalize(doc, root);
            let after = doc.descendants(root).count();
            debug!(
                "canonicalized {after} node(s), {} dropped as whitespace",
                before - after
            );
        } else {
            canonicalize(doc, root);
        }
        render(doc, &self.render_options)
    }
}

/// Sorts XML text with default options.
///
/// # Errors
///
/// See [`XmlSorter::sort_str`].
pub fn sort_str(text: &str) -> Result<String, SortError> {
    XmlSorter::new().sort_str(text)
}

/// Sorts a parsed document in place with default options and renders it.
///
/// # Errors
///
/// See [`XmlSorter::sort_document`].
pub fn sort_document(doc: &mut Document) -> Result<String, SortError> {
    XmlSorter::new().sort_document(doc)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sort_str_keeps_declaration() {
        let out = sort_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<r><b/><a/></r>").unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<r>\n    <a/>\n    <b/>\n</r>\n"
        );
    }

    #[test]
    fn test_sort_str_without_declaration() {
        assert_eq!(sort_str("<r/>").unwrap(), "<r/>\n");
    }

    #[test]
    fn test_sort_str_parse_error() {
        let err = sort_str("<r><a></r>").unwrap_err();
        assert!(matches!(err, SortError::Parse(_)));
    }

    #[test]
    fn test_sort_document_synthesizes_declaration() {
        let mut doc =
            Document::parse_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?><r><b/><a/></r>")
                .unwrap();
        let out = sort_document(&mut doc).unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n<r>\n    <a/>\n    <b/>\n</r>\n"
        );
    }

    #[test]
    fn test_sort_document_without_root() {
        let err = sort_document(&mut Document::new()).unwrap_err();
        assert!(matches!(err, SortError::Render { .. }));
    }

    #[test]
    fn test_sort_bytes_invalid_utf8() {
        let err = XmlSorter::new().sort_bytes(b"<r>\xFF</r>").unwrap_err();
        match err {
            SortError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sort_reader() {
        let out = XmlSorter::new()
            .sort_reader(&b"<r><b/><a/></r>"[..])
            .unwrap();
        assert_eq!(out, "<r>\n    <a/>\n    <b/>\n</r>\n");
    }

    #[test]
    fn test_sort_file_missing() {
        let err = XmlSorter::new()
            .sort_file("/nonexistent/input.xml")
            .unwrap_err();
        assert!(matches!(err, SortError::Io(_)));
    }

    #[test]
    fn test_custom_options() {
        let sorter = XmlSorter::with_options(
            ParseOptions::default().max_depth(2),
            RenderOptions::default().indent_str("  "),
        );
        assert_eq!(sorter.sort_str("<r><b/><a/></r>").unwrap(), "<r>\n  <a/>\n  <b/>\n</r>\n");
        assert!(sorter.sort_str("<r><a><b/></a></r>").is_err());
    }

    #[test]
    fn test_sorter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<XmlSorter>();
    }
}
