//! Element and document-level parsing.
//!
//! `XmlParser` drives [`ParserInput`] through the document grammar
//! (XML 1.0 §2.1 `[1] document`) and builds the arena tree. Prolog and
//! epilog whitespace is not kept; whitespace inside elements is kept as text
//! nodes and left for the sorter to drop.

use crate::error::ParseError;
use crate::tree::{split_qname, Attribute, Document, NodeId, NodeKind};

use super::input::{
    parse_cdata_content, parse_comment_content, parse_pi_content, parse_xml_decl,
    validate_qname, NamespaceResolver, ParserInput, XMLNS_NAMESPACE, XML_NAMESPACE,
};
use super::ParseOptions;

/// The core XML parser.
pub(crate) struct XmlParser<'a> {
    /// Shared low-level input state (position, peek, advance, name parsing, etc.).
    input: ParserInput<'a>,
    /// The document being built.
    doc: Document,
    /// Parser options.
    options: ParseOptions,
    /// Namespace resolver managing the scope stack.
    ns: NamespaceResolver,
}

impl<'a> XmlParser<'a> {
    pub fn new(input: &'a str, options: &ParseOptions) -> Self {
        let mut pi = ParserInput::new(input);
        pi.set_max_depth(options.max_depth);
        pi.set_max_name_length(options.max_name_length);

        Self {
            input: pi,
            doc: Document::new(),
            options: options.clone(),
            ns: NamespaceResolver::new(),
        }
    }

    /// Main parse entry point. Parses the entire document.
    pub fn parse(&mut self) -> Result<Document, ParseError> {
        // The XML declaration must sit at the very start (XML 1.0 §2.8).
        if self.input.looking_at_xml_decl() {
            self.parse_xml_declaration()?;
        } else if self.input.skip_whitespace() && self.input.looking_at_xml_decl() {
            return Err(self
                .input
                .fatal("XML declaration must be at the start of the document"));
        }

        self.parse_misc(self.doc.root())?;

        if self.looking_at_doctype() {
            return Err(self.doctype_error());
        }

        // Root element (required by XML 1.0 §2.1)
        if self.input.peek() == Some(b'<')
            && self
                .input
                .peek_at(1)
                .is_some_and(|b| b != b'!' && b != b'?')
        {
            self.parse_element(self.doc.root())?;
        } else {
            return Err(self.input.fatal("missing root element"));
        }

        self.parse_misc(self.doc.root())?;

        if !self.input.at_end() {
            return Err(self.input.fatal("content after document element"));
        }

        Ok(std::mem::take(&mut self.doc))
    }

    // --- XML Declaration ---
    // See XML 1.0 §2.8: [23] XMLDecl

    fn parse_xml_declaration(&mut self) -> Result<(), ParseError> {
        let decl = parse_xml_decl(&mut self.input)?;
        self.doc.version = Some(decl.version);
        self.doc.encoding = decl.encoding;
        self.doc.standalone = decl.standalone;
        Ok(())
    }

    // --- Misc (comments, PIs, whitespace) ---

    fn parse_misc(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            self.input.skip_whitespace();
            if self.input.at_end() {
                break;
            }
            if self.input.looking_at(b"<!--") {
                self.parse_comment(parent)?;
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction(parent)?;
            } else if self.looking_at_doctype() {
                return Err(self.doctype_error());
            } else {
                break;
            }
        }
        Ok(())
    }

    // --- DOCTYPE ---

    fn looking_at_doctype(&self) -> bool {
        self.input.looking_at(b"<!DOCTYPE") || self.input.looking_at(b"<!doctype")
    }

    /// Document type declarations are refused wherever they appear, which
    /// rules out external entities and entity expansion entirely.
    fn doctype_error(&self) -> ParseError {
        self.input.fatal("DOCTYPE is not allowed")
    }

    // --- Elements ---
    // See XML 1.0 §3.1: [39] element, [40] STag, [42] ETag, [44] EmptyElemTag

    fn parse_element(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        self.input.increment_depth()?;
        self.input.expect_byte(b'<')?;

        let name = self.input.parse_name()?;
        if let Some(msg) = validate_qname(&name) {
            return Err(self.input.fatal(format!("{msg}: '{name}'")));
        }

        let mut attributes = Vec::new();
        let is_empty = loop {
            let had_ws = self.input.skip_whitespace();
            if self.input.looking_at(b"/>") {
                self.input.advance(2);
                break true;
            }
            if self.input.peek() == Some(b'>') {
                self.input.advance(1);
                break false;
            }
            if self.input.at_end() {
                return Err(self.input.fatal("unexpected end of input in start tag"));
            }
            if !had_ws {
                return Err(self.input.fatal("whitespace required between attributes"));
            }

            let attr = self.parse_attribute()?;
            if attributes.iter().any(|a: &Attribute| a.name == attr.name) {
                return Err(self
                    .input
                    .fatal(format!("duplicate attribute: '{}'", attr.name)));
            }
            attributes.push(attr);
            if attributes.len() > self.options.max_attributes as usize {
                return Err(self.input.fatal(format!(
                    "too many attributes on element '{name}' (maximum {})",
                    self.options.max_attributes
                )));
            }
        };

        let has_ns_decls = attributes.iter().any(Attribute::is_namespace_decl);
        if has_ns_decls {
            self.ns.push_scope();
            self.bind_namespace_decls(&attributes)?;
        }

        self.check_element_prefix(&name)?;
        self.resolve_attribute_namespaces(&mut attributes)?;

        let elem_id = self.doc.create_node(NodeKind::Element {
            name: name.clone(),
            attributes,
        });
        self.doc.append_child(parent, elem_id);

        if !is_empty {
            self.parse_content(elem_id)?;

            self.input.expect_str(b"</")?;
            let end_name = self.input.parse_name()?;
            if end_name != name {
                return Err(self.input.fatal(format!(
                    "mismatched end tag: expected </{name}>, found </{end_name}>"
                )));
            }
            self.input.skip_whitespace();
            self.input.expect_byte(b'>')?;
        }

        if has_ns_decls {
            self.ns.pop_scope();
        }
        self.input.decrement_depth();
        Ok(elem_id)
    }

    // --- Namespaces ---
    // See Namespaces in XML 1.0 §3 and §5

    fn bind_namespace_decls(&mut self, attributes: &[Attribute]) -> Result<(), ParseError> {
        for attr in attributes.iter().filter(|a| a.is_namespace_decl()) {
            if attr.name == "xmlns" {
                if attr.value == XML_NAMESPACE || attr.value == XMLNS_NAMESPACE {
                    return Err(self.input.fatal(format!(
                        "reserved namespace '{}' cannot be the default namespace",
                        attr.value
                    )));
                }
                self.ns.bind(None, attr.value.clone());
                continue;
            }

            let prefix = attr.local_name();
            if prefix == "xmlns" {
                return Err(self.input.fatal("the 'xmlns' prefix cannot be declared"));
            }
            if prefix == "xml" {
                if attr.value != XML_NAMESPACE {
                    return Err(self
                        .input
                        .fatal("the 'xml' prefix cannot be bound to another namespace"));
                }
                continue;
            }
            if attr.value.is_empty() {
                return Err(self
                    .input
                    .fatal(format!("namespace prefix '{prefix}' bound to an empty URI")));
            }
            if attr.value == XML_NAMESPACE || attr.value == XMLNS_NAMESPACE {
                return Err(self.input.fatal(format!(
                    "reserved namespace '{}' cannot be bound to prefix '{prefix}'",
                    attr.value
                )));
            }
            self.ns.bind(Some(prefix.to_string()), attr.value.clone());
        }
        Ok(())
    }

    /// Element names keep their prefix as written; the prefix only has to
    /// be in scope.
    fn check_element_prefix(&self, name: &str) -> Result<(), ParseError> {
        match split_qname(name).0 {
            Some("xmlns") => Err(self
                .input
                .fatal(format!("element name '{name}' uses the reserved 'xmlns' prefix"))),
            Some(prefix) if self.ns.resolve(Some(prefix)).is_none() => Err(self
                .input
                .fatal(format!("namespace prefix '{prefix}' is not bound"))),
            _ => Ok(()),
        }
    }

    fn resolve_attribute_namespaces(
        &self,
        attributes: &mut [Attribute],
    ) -> Result<(), ParseError> {
        for attr in attributes.iter_mut() {
            if attr.is_namespace_decl() {
                attr.namespace = Some(XMLNS_NAMESPACE.to_string());
            } else if let Some(prefix) = attr.prefix() {
                let uri = self.ns.resolve(Some(prefix)).ok_or_else(|| {
                    self.input
                        .fatal(format!("namespace prefix '{prefix}' is not bound"))
                })?;
                attr.namespace = Some(uri.to_string());
            }
        }

        // Namespaces in XML 1.0 §6.3: no two attributes may share both the
        // local name and the namespace URI.
        for (i, a) in attributes.iter().enumerate() {
            if a.namespace.is_none() {
                continue;
            }
            let clash = attributes[i + 1..]
                .iter()
                .any(|b| b.namespace == a.namespace && b.local_name() == a.local_name());
            if clash {
                return Err(self.input.fatal(format!(
                    "attribute '{}' duplicated through namespace binding",
                    a.local_name()
                )));
            }
        }
        Ok(())
    }

    // --- Content ---
    // See XML 1.0 §3.1: [43] content

    fn parse_content(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            if self.input.at_end() {
                return Err(self
                    .input
                    .fatal("unexpected end of input in element content"));
            }

            // End tag starts
            if self.input.looking_at(b"</") {
                break;
            }

            if self.input.looking_at(b"<![CDATA[") {
                self.parse_cdata(parent)?;
            } else if self.input.looking_at(b"<!--") {
                self.parse_comment(parent)?;
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction(parent)?;
            } else if self.looking_at_doctype() {
                return Err(self.doctype_error());
            } else if self.input.peek() == Some(b'<') {
                self.parse_element(parent)?;
            } else {
                self.parse_char_data(parent)?;
            }
        }
        Ok(())
    }

    // --- Character Data ---
    // See XML 1.0 §2.4: [14] CharData

    fn parse_char_data(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let mut text = String::new();

        while let Some(b) = self.input.peek() {
            match b {
                b'<' => break,
                b'&' => text.push(self.input.parse_reference()?),
                b']' if self.input.looking_at(b"]]>") => {
                    return Err(self
                        .input
                        .fatal("']]>' not allowed in character data"));
                }
                _ => text.push(self.input.next_char()?),
            }
        }

        if !text.is_empty() {
            let text_id = self.doc.create_node(NodeKind::Text { content: text });
            self.doc.append_child(parent, text_id);
        }
        Ok(())
    }

    // --- Attributes ---
    // See XML 1.0 §3.1: [41] Attribute

    fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let name = self.input.parse_name()?;
        if let Some(msg) = validate_qname(&name) {
            return Err(self.input.fatal(format!("{msg}: '{name}'")));
        }
        self.input.skip_whitespace();
        self.input.expect_byte(b'=')?;
        self.input.skip_whitespace();
        let value = self.input.parse_attribute_value()?;
        Ok(Attribute::new(name, value))
    }

    // --- Comments ---
    // See XML 1.0 §2.5: [15] Comment

    fn parse_comment(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let content = parse_comment_content(&mut self.input)?;
        let comment_id = self.doc.create_node(NodeKind::Comment { content });
        self.doc.append_child(parent, comment_id);
        Ok(())
    }

    // --- CDATA Sections ---
    // See XML 1.0 §2.7: [18] CDSect

    fn parse_cdata(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let content = parse_cdata_content(&mut self.input)?;
        let cdata_id = self.doc.create_node(NodeKind::CData { content });
        self.doc.append_child(parent, cdata_id);
        Ok(())
    }

    // --- Processing Instructions ---
    // See XML 1.0 §2.6: [16] PI

    fn parse_processing_instruction(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let (target, data) = parse_pi_content(&mut self.input)?;
        let pi_id = self
            .doc
            .create_node(NodeKind::ProcessingInstruction { target, data });
        self.doc.append_child(parent, pi_id);
        Ok(())
    }
}
