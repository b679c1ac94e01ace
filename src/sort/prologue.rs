//! XML declaration handling.
//!
//! The declaration is not part of the tree, so it is cut off the input text
//! before parsing and put back in front of the rendered body afterwards.

use std::fmt;

use crate::tree::Document;

/// XML whitespace (`S` production). Other Unicode spaces such as U+00A0 are
/// character data and must reach the parser.
const XML_WHITESPACE: [char; 4] = [' ', '\t', '\r', '\n'];

/// A raw XML declaration captured from the input, markers included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration(String);

impl Declaration {
    /// Returns the declaration text, e.g. `<?xml version="1.0"?>`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits off and reattaches the XML declaration.
#[derive(Debug, Clone, Copy)]
pub struct Prologue;

impl Prologue {
    /// Separates a leading XML declaration from the rest of the document.
    ///
    /// Leading and trailing XML whitespace is trimmed first, after dropping
    /// a byte order mark. Only `<?xml` followed by whitespace or `?>` is a
    /// declaration; a PI such as `<?xml-stylesheet ...?>` is left in the body.
    /// The returned body is trimmed.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlsorter::sort::Prologue;
    ///
    /// let (decl, body) = Prologue::strip("  <?xml version=\"1.0\"?>\n<r/>\n");
    /// assert_eq!(decl.unwrap().as_str(), "<?xml version=\"1.0\"?>");
    /// assert_eq!(body, "<r/>");
    /// ```
    #[must_use]
    pub fn strip(text: &str) -> (Option<Declaration>, &str) {
        let text = text
            .trim_start_matches('\u{FEFF}')
            .trim_matches(XML_WHITESPACE);
        if !starts_with_declaration(text) {
            return (None, text);
        }
        match text.find("?>") {
            Some(pos) => {
                let end = pos + "?>".len();
                (
                    Some(Declaration(text[..end].to_string())),
                    text[end..].trim_matches(XML_WHITESPACE),
                )
            }
            // Unterminated: leave it for the parser to reject.
            None => (None, text),
        }
    }

    /// Puts a declaration in front of a rendered body.
    ///
    /// A captured declaration is written back verbatim. Without one, a
    /// declaration is synthesized from the document metadata, but only when
    /// the document reports an encoding. Otherwise the body is returned as is.
    #[must_use]
    pub fn reattach(declaration: Option<&Declaration>, doc: &Document, body: &str) -> String {
        if let Some(decl) = declaration {
            return format!("{decl}\n{body}");
        }
        match synthesize(doc) {
            Some(decl) => format!("{decl}\n{body}"),
            None => body.to_string(),
        }
    }
}

fn starts_with_declaration(text: &str) -> bool {
    text.strip_prefix("<?xml").is_some_and(|rest| {
        rest.starts_with("?>") || rest.starts_with(XML_WHITESPACE)
    })
}

/// Builds `<?xml version=".." encoding=".." standalone=".."?>` from the
/// document metadata, or `None` when no encoding is known.
fn synthesize(doc: &Document) -> Option<String> {
    let encoding = doc.encoding.as_deref()?;
    let version = doc.version.as_deref().unwrap_or("1.0");
    let standalone = if doc.standalone == Some(true) {
        "yes"
    } else {
        "no"
    };
    Some(format!(
        "<?xml version=\"{version}\" encoding=\"{encoding}\" standalone=\"{standalone}\"?>"
    ))
}
