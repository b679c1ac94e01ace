//! Node type definitions.
//!
//! The `NodeKind` enum is the closed set of node kinds the sorter works with.
//! Each variant carries its payload; navigation links live in `NodeData`.

use super::Attribute;

/// The kind of an XML node and its associated data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document,

    /// An element node, e.g., `<ns:item id="x">`.
    Element {
        /// The qualified name as written (`ns:item`).
        name: String,
        /// Attributes in their current iteration order.
        attributes: Vec<Attribute>,
    },

    /// Character data (entity and character references already resolved).
    Text {
        /// The decoded text.
        content: String,
    },

    /// A CDATA section, e.g., `<![CDATA[...]]>`.
    CData {
        /// The raw section content, without the markers.
        content: String,
    },

    /// A comment node, e.g., `<!-- ... -->`.
    Comment {
        /// The comment text (without the `<!--` and `-->` delimiters).
        content: String,
    },

    /// A processing instruction, e.g., `<?target data?>`.
    ProcessingInstruction {
        /// The PI target (e.g., `"xml-stylesheet"`).
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },
}

impl NodeKind {
    /// Returns `true` for element nodes.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }

    /// Returns `true` for text nodes that hold nothing but XML whitespace.
    ///
    /// Empty text counts as whitespace. CDATA sections never do.
    #[must_use]
    pub fn is_blank_text(&self) -> bool {
        match self {
            Self::Text { content } => content
                .bytes()
                .all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n')),
            _ => false,
        }
    }
}
