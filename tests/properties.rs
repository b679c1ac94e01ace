//! Properties that must hold for any input: idempotence, determinism, and
//! insensitivity to source order and layout.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use xmlsorter::{sort_document, sort_str, Document, XmlSorter};

const SAMPLES: &[&str] = &[
    "<r/>",
    r#"<r b="2" a="1"><z/><y k="v">text</y><!--c--><x/></r>"#,
    "<?xml version=\"1.0\"?><doc><p>one <b>two</b> three <i>four</i></p><q><![CDATA[x]]></q></doc>",
    "<!--top--><?app run?><r xmlns:n=\"urn:n\"><n:b/><n:a n:id=\"1\"/><!--tail--></r><!--bottom-->",
    "<r><e>b<x/>a</e><e>a<y/>b</e><e/><e a=\"\"/></r>",
    "<catalog>\n  <book id=\"2\">\n    <title>B</title>\n  </book>\n  <book id=\"1\">\n    <title>A</title>\n  </book>\n</catalog>",
    "<r>\r\n<t a=\"x&#9;y&#10;z\">line1\r\nline2&#13;</t>\r\n</r>",
];

#[test]
fn test_idempotence() {
    for input in SAMPLES {
        let once = sort_str(input).unwrap();
        let twice = sort_str(&once).unwrap();
        assert_eq!(once, twice, "not idempotent for {input:?}");
    }
}

#[test]
fn test_determinism() {
    for input in SAMPLES {
        assert_eq!(sort_str(input).unwrap(), sort_str(input).unwrap());
    }
}

#[test]
fn test_concurrent_sorting_is_deterministic() {
    let sorter = Arc::new(XmlSorter::new());
    let expected: Vec<String> = SAMPLES.iter().map(|s| sorter.sort_str(s).unwrap()).collect();
    let expected = Arc::new(expected);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let sorter = Arc::clone(&sorter);
            let expected = Arc::clone(&expected);
            thread::spawn(move || {
                for round in 0..20 {
                    // Interleave documents with and without a declaration.
                    let i = (t + round) % SAMPLES.len();
                    assert_eq!(sorter.sort_str(SAMPLES[i]).unwrap(), expected[i]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_scoped_threads_share_sorter() {
    let sorter = XmlSorter::new();
    let with_decl = "<?xml version=\"1.0\"?><r><b/><a/></r>";
    let without = "<r><d/><c/></r>";
    thread::scope(|s| {
        let a = s.spawn(|| sorter.sort_str(with_decl).unwrap());
        let b = s.spawn(|| sorter.sort_str(without).unwrap());
        assert!(a.join().unwrap().starts_with("<?xml"));
        assert!(b.join().unwrap().starts_with("<r>"));
    });
}

#[test]
fn test_order_and_layout_insensitive() {
    let a = r#"<config><db port="5432" host="h"/><cache ttl="60"/><!--flags--><flag on="1"/></config>"#;
    let b = "<config>\n\t<!--flags-->\n\t<flag on=\"1\"/>\n\t<cache ttl=\"60\"/>\n\t<db host=\"h\" port=\"5432\"/>\n</config>\n";
    assert_eq!(sort_str(a).unwrap(), sort_str(b).unwrap());
}

#[test]
fn test_text_and_cdata_fidelity() {
    let out = sort_str("<r><t>a &amp; b &lt; c</t><c><![CDATA[<&>]]></c></r>").unwrap();
    let doc = Document::parse_str(&out).unwrap();
    let root = doc.root_element().unwrap();
    let texts: Vec<String> = doc
        .children(root)
        .filter(|&id| doc.node(id).kind.is_element())
        .map(|id| xmlsorter::sort::text_content(&doc, id))
        .collect();
    assert_eq!(texts, vec!["<&>".to_string(), "a & b < c".to_string()]);
}

#[test]
fn test_declaration_round_trip() {
    let decl = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\" standalone=\"no\"?>";
    let out = sort_str(&format!("{decl}\n<r/>")).unwrap();
    assert_eq!(out, format!("{decl}\n<r/>\n"));
}

#[test]
fn test_stylesheet_pi_not_mistaken_for_declaration() {
    let out = sort_str("<?xml-stylesheet href=\"a.xsl\"?>\n<r/>").unwrap();
    assert_eq!(out, "<?xml-stylesheet href=\"a.xsl\"?>\n<r/>\n");
}

#[test]
fn test_sort_document_synthesizes_declaration() {
    let mut doc =
        Document::parse_str("<?xml version=\"1.1\" encoding=\"UTF-8\"?><r><b/><a/></r>").unwrap();
    let out = sort_document(&mut doc).unwrap();
    assert_eq!(
        out,
        "<?xml version=\"1.1\" encoding=\"UTF-8\" standalone=\"no\"?>\n<r>\n    <a/>\n    <b/>\n</r>\n"
    );

    let mut bare = Document::parse_str("<?xml version=\"1.0\" standalone=\"yes\"?><r/>").unwrap();
    assert_eq!(sort_document(&mut bare).unwrap(), "<r/>\n");
}

#[test]
fn test_byte_input_with_bom() {
    let sorter = XmlSorter::new();

    let mut utf8 = vec![0xEF, 0xBB, 0xBF];
    utf8.extend_from_slice(b"<r><b/><a/></r>");
    assert_eq!(sorter.sort_bytes(&utf8).unwrap(), "<r>\n    <a/>\n    <b/>\n</r>\n");

    let mut utf16 = vec![0xFF, 0xFE];
    utf16.extend("<r><é/><a/></r>".encode_utf16().flat_map(u16::to_le_bytes));
    assert_eq!(sorter.sort_bytes(&utf16).unwrap(), "<r>\n    <a/>\n    <é/>\n</r>\n");
}

#[test]
fn test_whitespace_only_text_never_survives() {
    let mut doc = Document::parse_str("<r>\n   <a>\n      <b/>\n   </a>\n</r>").unwrap();
    let out = sort_document(&mut doc).unwrap();
    assert_eq!(out, "<r>\n    <a>\n        <b/>\n    </a>\n</r>\n");
    let root = doc.root_element().unwrap();
    assert!(doc
        .descendants(root)
        .all(|id| !doc.node(id).kind.is_blank_text()));
}
