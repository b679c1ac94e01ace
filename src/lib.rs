//! # xmlsorter
//!
//! Canonical ordering for XML documents. Attributes, sibling elements, and
//! the text inside elements are put in a fixed deterministic order, so two
//! documents that differ only in element or attribute order, or in
//! indentation, render to byte-identical text. Comments and processing
//! instructions stay attached to the element they preceded.
//!
//! ## Quick Start
//!
//! ```
//! let sorted = xmlsorter::sort_str(
//!     r#"<?xml version="1.0"?>
//!        <config>
//!            <!-- the server -->
//!            <server port="80" host="b"/>
//!            <client id="2"/>
//!            <client id="1"/>
//!        </config>"#,
//! ).unwrap();
//!
//! assert_eq!(
//!     sorted,
//!     "<?xml version=\"1.0\"?>\n\
//!      <config>\n    \
//!          <client id=\"1\"/>\n    \
//!          <client id=\"2\"/>\n    \
//!          <!-- the server -->\n    \
//!          <server host=\"b\" port=\"80\"/>\n\
//!      </config>\n"
//! );
//! ```
//!
//! Documents containing a DOCTYPE are rejected, so external entities are
//! never resolved.

pub mod encoding;
pub mod error;
pub mod parser;
pub mod serial;
pub mod sort;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use error::{ParseError, SortError};
pub use sort::{sort_document, sort_str, XmlSorter};
pub use tree::{Attribute, Document, NodeId};
