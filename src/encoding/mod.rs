//! Byte-source decoding.
//!
//! Sorting works on text, but files, stdin, and uploads arrive as bytes. This
//! module turns such a byte source into a UTF-8 `String`, following the
//! detection rules of XML 1.0 §4.3.3 and Appendix F and delegating the actual
//! conversion to `encoding_rs`:
//!
//! 1. A Byte Order Mark, if present, picks the initial encoding and is dropped.
//! 2. Without a BOM the input is taken as UTF-8.
//! 3. An `encoding="..."` in the XML declaration that disagrees with the
//!    initial guess wins, and the bytes are decoded again with it.

use std::fmt;

/// An error that occurs during encoding detection or transcoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingError {
    /// A human-readable description of the encoding error.
    pub message: String,
}

impl EncodingError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding error: {}", self.message)
    }
}

impl std::error::Error for EncodingError {}

/// Detects the encoding of an XML byte stream from its Byte Order Mark.
///
/// Returns the encoding label and the number of BOM bytes to skip. Input
/// without a BOM reports `("UTF-8", 0)`.
///
/// # Examples
///
/// ```
/// use xmlsorter::encoding::detect_encoding;
///
/// assert_eq!(detect_encoding(b"\xEF\xBB\xBF<r/>"), ("UTF-8", 3));
/// assert_eq!(detect_encoding(b"\xFF\xFE<\0"), ("UTF-16LE", 2));
/// assert_eq!(detect_encoding(b"<r/>"), ("UTF-8", 0));
/// ```
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static str, usize) {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => ("UTF-8", 3),
        [0xFE, 0xFF, ..] => ("UTF-16BE", 2),
        [0xFF, 0xFE, ..] => ("UTF-16LE", 2),
        _ => ("UTF-8", 0),
    }
}

/// Transcodes a byte slice from the named encoding into a UTF-8 `String`.
///
/// The label is looked up case-insensitively through
/// `encoding_rs::Encoding::for_label`.
///
/// # Errors
///
/// Returns `EncodingError` if the label is unknown or the bytes are malformed
/// for that encoding.
pub fn transcode(bytes: &[u8], encoding_name: &str) -> Result<String, EncodingError> {
    let encoding = encoding_rs::Encoding::for_label(encoding_name.as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {encoding_name}")))?;

    let (result, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::new(format!(
            "malformed byte sequence for encoding {encoding_name}"
        )));
    }
    Ok(result.into_owned())
}

/// Decodes a raw XML byte source into a UTF-8 string.
///
/// The BOM, if any, is not part of the result.
///
/// # Errors
///
/// Returns `EncodingError` if the bytes are invalid for the detected encoding
/// or the declared encoding is not supported.
///
/// # Examples
///
/// ```
/// use xmlsorter::encoding::decode_to_utf8;
///
/// let latin1 = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r>caf\xE9</r>";
/// assert!(decode_to_utf8(latin1).unwrap().ends_with("<r>café</r>"));
/// ```
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String, EncodingError> {
    let (bom_encoding, bom_skip) = detect_encoding(bytes);
    let content = &bytes[bom_skip..];

    if bom_encoding == "UTF-8" {
        // The declaration is ASCII in every encoding this path accepts, so it
        // can be read before the bytes are known to be valid UTF-8.
        if let Some(declared) = declared_encoding(content) {
            if !is_utf8_label(&declared) {
                return transcode(content, &declared);
            }
        }
        return std::str::from_utf8(content)
            .map(str::to_string)
            .map_err(|e| EncodingError::new(format!("input is not valid UTF-8: {e}")));
    }

    let text = transcode(content, bom_encoding)?;
    match declared_encoding(text.as_bytes()) {
        Some(declared) if !is_compatible_label(&declared, bom_encoding) => {
            transcode(content, &declared)
        }
        _ => Ok(text),
    }
}

/// Reads the `encoding` pseudo-attribute of a leading XML declaration.
///
/// Only the first 200 bytes are scanned. Returns `None` when there is no
/// declaration or it carries no encoding.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(200)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let decl_end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..decl_end];

    let needle = b"encoding";
    let pos = decl.windows(needle.len()).position(|w| w == needle)?;
    let rest = skip_ascii_whitespace(&decl[pos + needle.len()..]);
    let rest = skip_ascii_whitespace(rest.strip_prefix(b"=")?);

    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = rest.iter().position(|&b| b == quote)?;
    let label = &rest[..end];
    label
        .is_ascii()
        .then(|| String::from_utf8_lossy(label).into_owned())
}

fn skip_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    &bytes[skip..]
}

fn is_utf8_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("UTF-8") || label.eq_ignore_ascii_case("UTF8")
}

/// A declared label agrees with the BOM when it names the same encoding, or
/// says plain `UTF-16` and leaves the byte order to the BOM.
fn is_compatible_label(declared: &str, bom_encoding: &str) -> bool {
    declared.eq_ignore_ascii_case(bom_encoding)
        || (declared.eq_ignore_ascii_case("UTF-16") && bom_encoding.starts_with("UTF-16"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn utf16le(s: &str) -> Vec<u8> {
        let mut out = vec![0xFF, 0xFE];
        out.extend(s.encode_utf16().flat_map(u16::to_le_bytes));
        out
    }

    fn utf16be(s: &str) -> Vec<u8> {
        let mut out = vec![0xFE, 0xFF];
        out.extend(s.encode_utf16().flat_map(u16::to_be_bytes));
        out
    }

    #[test]
    fn test_detect_boms() {
        assert_eq!(detect_encoding(b"\xEF\xBB\xBF<r/>"), ("UTF-8", 3));
        assert_eq!(detect_encoding(b"\xFE\xFF\x00<"), ("UTF-16BE", 2));
        assert_eq!(detect_encoding(b"\xFF\xFE<\x00"), ("UTF-16LE", 2));
        assert_eq!(detect_encoding(b"<r/>"), ("UTF-8", 0));
        assert_eq!(detect_encoding(b""), ("UTF-8", 0));
        assert_eq!(detect_encoding(b"\xEF"), ("UTF-8", 0));
    }

    #[test]
    fn test_decode_utf8_strips_bom() {
        let result = decode_to_utf8(b"\xEF\xBB\xBF<r/>").unwrap();
        assert_eq!(result, "<r/>");
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-16\"?><r>é</r>";
        assert_eq!(decode_to_utf8(&utf16le(xml)).unwrap(), xml);
        assert_eq!(decode_to_utf8(&utf16be(xml)).unwrap(), xml);
    }

    #[test]
    fn test_decode_declared_latin1() {
        let bytes = b"<?xml version=\"1.0\" encoding='ISO-8859-1'?><r>\xE9</r>";
        let result = decode_to_utf8(bytes).unwrap();
        assert!(result.ends_with("<r>é</r>"));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = decode_to_utf8(b"<r>\xFF\xFE\xFD</r>").unwrap_err();
        assert!(err.message.contains("not valid UTF-8"));
    }

    #[test]
    fn test_transcode_unknown_encoding() {
        let err = transcode(b"x", "NOT-AN-ENCODING").unwrap_err();
        assert_eq!(err.to_string(), "encoding error: unsupported encoding: NOT-AN-ENCODING");
    }

    #[test]
    fn test_declared_encoding() {
        assert_eq!(
            declared_encoding(b"<?xml version=\"1.0\" encoding = \"UTF-8\"?>"),
            Some("UTF-8".to_string())
        );
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><r/>"), None);
        assert_eq!(declared_encoding(b"<r encoding=\"x\"/>"), None);
    }

    #[test]
    fn test_encoding_error_is_error_trait() {
        let err: Box<dyn std::error::Error + Send + Sync> = Box::new(EncodingError::new("x"));
        assert_eq!(err.to_string(), "encoding error: x");
    }
}
