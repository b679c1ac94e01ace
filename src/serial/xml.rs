//! XML renderer.
//!
//! Writes a `Document` as indented XML. Elements whose content is only
//! markup (elements, comments, PIs) put each child on its own line, one
//! indentation step deeper. Elements that carry text or CDATA are written
//! inline so that no whitespace is added to their character data.

use std::io;

use crate::error::SortError;
use crate::tree::{Document, NodeId, NodeKind};

/// Options controlling rendered output.
///
/// # Examples
///
/// ```
/// use xmlsorter::Document;
/// use xmlsorter::serial::{render, RenderOptions};
///
/// let doc = Document::parse_str("<root><child/></root>").unwrap();
/// let xml = render(&doc, &RenderOptions::default().indent_str("\t")).unwrap();
/// assert_eq!(xml, "<root>\n\t<child/>\n</root>\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// The string written once per nesting level. Defaults to four spaces.
    pub indent_str: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent_str: "    ".to_string(),
        }
    }
}

impl RenderOptions {
    /// Sets the indentation string used for each nesting level.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }
}

/// Renders a document to an XML string without an XML declaration.
///
/// Top-level comments and processing instructions are placed on their own
/// lines around the root element. The output ends with a newline.
///
/// # Errors
///
/// Returns [`SortError::Render`] if the document has no root element.
pub fn render(doc: &Document, options: &RenderOptions) -> Result<String, SortError> {
    if doc.root_element().is_none() {
        return Err(SortError::render("document has no root element"));
    }

    let mut out = String::new();
    for child in doc.children(doc.root()) {
        if doc.node(child).kind.is_blank_text() {
            continue;
        }
        write_node(doc, child, &mut out, options, 0, false);
        out.push('\n');
    }
    Ok(out)
}

/// Renders a document into an `io::Write` sink.
///
/// Nothing is written if rendering fails before output starts.
///
/// # Errors
///
/// Returns [`SortError::Render`] if the document has no root element or the
/// writer fails.
pub fn render_to<W: io::Write>(
    doc: &Document,
    options: &RenderOptions,
    mut writer: W,
) -> Result<(), SortError> {
    let text = render(doc, options)?;
    writer
        .write_all(text.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|e| SortError::Render {
            message: "failed to write output".to_string(),
            source: Some(e),
        })
}

/// Returns `true` if the element holds no character data, meaning its
/// children can be laid out one per line.
///
/// Whitespace-only text is ignorable here and does not count.
fn is_element_only(doc: &Document, id: NodeId) -> bool {
    doc.children(id).all(|child| match &doc.node(child).kind {
        NodeKind::Text { .. } => doc.node(child).kind.is_blank_text(),
        NodeKind::CData { .. } => false,
        _ => true,
    })
}

fn write_indent(out: &mut String, options: &RenderOptions, depth: usize) {
    for _ in 0..depth {
        out.push_str(&options.indent_str);
    }
}

/// Writes one node. When `inline` is set the node sits inside character
/// data and nothing but the node itself may be written.
fn write_node(
    doc: &Document,
    id: NodeId,
    out: &mut String,
    options: &RenderOptions,
    depth: usize,
    inline: bool,
) {
    match &doc.node(id).kind {
        NodeKind::Element {
            name, attributes, ..
        } => {
            if !inline {
                write_indent(out, options, depth);
            }
            out.push('<');
            out.push_str(name);
            for attr in attributes {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                write_escaped_attr(out, &attr.value);
                out.push('"');
            }

            let element_only = !inline && is_element_only(doc, id);
            let children: Vec<NodeId> = doc
                .children(id)
                .filter(|&c| !(element_only && doc.node(c).kind.is_blank_text()))
                .collect();

            if children.is_empty() {
                out.push_str("/>");
                return;
            }

            out.push('>');
            if element_only {
                for child in children {
                    out.push('\n');
                    write_node(doc, child, out, options, depth + 1, false);
                }
                out.push('\n');
                write_indent(out, options, depth);
            } else {
                for child in children {
                    write_node(doc, child, out, options, depth + 1, true);
                }
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeKind::Text { content } => write_escaped_text(out, content),
        NodeKind::CData { content } => {
            // A literal "]]>" cannot live in one section; split it across two.
            out.push_str("<![CDATA[");
            out.push_str(&content.replace("]]>", "]]]]><![CDATA[>"));
            out.push_str("]]>");
        }
        NodeKind::Comment { content } => {
            if !inline {
                write_indent(out, options, depth);
            }
            out.push_str("<!--");
            out.push_str(content);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction { target, data } => {
            if !inline {
                write_indent(out, options, depth);
            }
            out.push_str("<?");
            out.push_str(target);
            if let Some(d) = data {
                out.push(' ');
                out.push_str(d);
            }
            out.push_str("?>");
        }
        NodeKind::Document => {}
    }
}

/// Escapes character data. `\r` must survive a re-parse, so it becomes a
/// character reference.
fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes a double-quoted attribute value. Whitespace other than the space
/// character is written as a reference so attribute normalization on
/// re-parse leaves the value intact.
fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}
