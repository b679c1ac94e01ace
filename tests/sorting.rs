//! End-to-end sorting behavior.
//!
//! Each case sorts an input document and compares the exact output. The
//! expected text is then sorted again and must come back unchanged.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use xmlsorter::{sort_str, SortError};

/// Sorts `input`, checks it against `expected`, and checks `expected` is a
/// fixed point.
fn assert_sorts_to(input: &str, expected: &str) {
    let sorted = sort_str(input).unwrap_or_else(|e| panic!("sort failed: {e}"));
    assert_eq!(sorted, expected);
    let resorted = sort_str(expected).unwrap_or_else(|e| panic!("re-sort failed: {e}"));
    assert_eq!(resorted, expected, "expected output is not a fixed point");
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[test]
fn test_sibling_node_ordering() {
    assert_sorts_to(
        "<root><zebra/><apple/><mango/></root>",
        "<root>\n    <apple/>\n    <mango/>\n    <zebra/>\n</root>\n",
    );
}

#[test]
fn test_attribute_ordering() {
    assert_sorts_to(
        r#"<root><item zeta="3" alpha="1" mid="2"/></root>"#,
        "<root>\n    <item alpha=\"1\" mid=\"2\" zeta=\"3\"/>\n</root>\n",
    );
}

#[test]
fn test_node_comparison_by_attribute_names() {
    assert_sorts_to(
        r#"<root><item b="1"/><item a="1" c="1"/><item a="1"/></root>"#,
        "<root>\n    <item a=\"1\"/>\n    <item a=\"1\" c=\"1\"/>\n    <item b=\"1\"/>\n</root>\n",
    );
}

#[test]
fn test_node_comparison_by_attribute_values() {
    assert_sorts_to(
        r#"<root><item id="c"/><item id="a"/><item id="b"/></root>"#,
        "<root>\n    <item id=\"a\"/>\n    <item id=\"b\"/>\n    <item id=\"c\"/>\n</root>\n",
    );
}

#[test]
fn test_attribute_values_are_compared_as_text() {
    assert_sorts_to(
        r#"<list><n v="10"/><n v="9"/><n v="100"/></list>"#,
        "<list>\n    <n v=\"10\"/>\n    <n v=\"100\"/>\n    <n v=\"9\"/>\n</list>\n",
    );
}

#[test]
fn test_node_comparison_by_text_content() {
    assert_sorts_to(
        "<fruits><name>cherry</name><name>apple</name><name>banana</name></fruits>",
        "<fruits>\n    <name>apple</name>\n    <name>banana</name>\n    <name>cherry</name>\n</fruits>\n",
    );
}

#[test]
fn test_uppercase_sorts_before_lowercase() {
    assert_sorts_to(
        "<r><b/><B/><a/><A/></r>",
        "<r>\n    <A/>\n    <B/>\n    <a/>\n    <b/>\n</r>\n",
    );
}

#[test]
fn test_multi_level_nesting() {
    assert_sorts_to(
        "<a><c><f/><e/></c><b><d><h/><g/></d></b></a>",
        "<a>\n    <b>\n        <d>\n            <g/>\n            <h/>\n        </d>\n    </b>\n    \
         <c>\n        <e/>\n        <f/>\n    </c>\n</a>\n",
    );
}

#[test]
fn test_attributes_and_nested_nodes() {
    assert_sorts_to(
        r#"<library><book year="2001" id="b2"><title>Second</title><author>Zed</author></book><book id="b1" year="1999"><author>Amy</author><title>First</title></book></library>"#,
        "<library>\n    <book id=\"b1\" year=\"1999\">\n        <author>Amy</author>\n        <title>First</title>\n    </book>\n    \
         <book id=\"b2\" year=\"2001\">\n        <author>Zed</author>\n        <title>Second</title>\n    </book>\n</library>\n",
    );
}

#[test]
fn test_attributes_only_elements() {
    assert_sorts_to(
        r#"<r><e z="1" y="2"/><e y="1" z="2"/></r>"#,
        "<r>\n    <e y=\"1\" z=\"2\"/>\n    <e y=\"2\" z=\"1\"/>\n</r>\n",
    );
}

#[test]
fn test_empty_elements() {
    assert_sorts_to(
        "<r><b></b><a/><c>   </c></r>",
        "<r>\n    <a/>\n    <b/>\n    <c/>\n</r>\n",
    );
}

// ---------------------------------------------------------------------------
// Non-element nodes
// ---------------------------------------------------------------------------

#[test]
fn test_comment_preservation() {
    assert_sorts_to(
        "<root><!-- second --><b/><!-- first --><a/></root>",
        "<root>\n    <!-- first -->\n    <a/>\n    <!-- second -->\n    <b/>\n</root>\n",
    );
}

#[test]
fn test_trailing_comment_stays_last() {
    assert_sorts_to(
        "<root><b/><a/><!-- the end --></root>",
        "<root>\n    <a/>\n    <b/>\n    <!-- the end -->\n</root>\n",
    );
}

#[test]
fn test_processing_instructions_preservation() {
    assert_sorts_to(
        "<?xml-stylesheet type=\"text/xsl\" href=\"s.xsl\"?><root><?render fast?><b/><a/></root>",
        "<?xml-stylesheet type=\"text/xsl\" href=\"s.xsl\"?>\n<root>\n    <a/>\n    <?render fast?>\n    <b/>\n</root>\n",
    );
}

#[test]
fn test_comments_and_pi_runs() {
    assert_sorts_to(
        "<!-- top --><r><!--1--><?p one?><z/><!--2--><y/></r><!-- bottom -->",
        "<!-- top -->\n<r>\n    <!--2-->\n    <y/>\n    <!--1-->\n    <?p one?>\n    <z/>\n</r>\n<!-- bottom -->\n",
    );
}

#[test]
fn test_non_element_nodes_only() {
    assert_sorts_to(
        "<r><!--c--><?pi?></r>",
        "<r>\n    <!--c-->\n    <?pi?>\n</r>\n",
    );
}

#[test]
fn test_cdata_preservation() {
    assert_sorts_to(
        "<r><s><![CDATA[if (a < b && c) {}]]></s><q><![CDATA[  ]]></q></r>",
        "<r>\n    <q><![CDATA[  ]]></q>\n    <s><![CDATA[if (a < b && c) {}]]></s>\n</r>\n",
    );
}

#[test]
fn test_cdata_sections_order_by_text() {
    assert_sorts_to(
        "<r><e><![CDATA[b]]></e><e>a</e></r>",
        "<r>\n    <e>a</e>\n    <e><![CDATA[b]]></e>\n</r>\n",
    );
}

#[test]
fn test_mixed_content() {
    assert_sorts_to(
        "<doc><p>Hello <b>bold</b> and <a>link</a> end</p></doc>",
        "<doc>\n    <p> and <a>link</a>Hello <b>bold</b> end</p>\n</doc>\n",
    );
}

// ---------------------------------------------------------------------------
// Whitespace, entities, namespaces
// ---------------------------------------------------------------------------

#[test]
fn test_whitespace_handling() {
    assert_sorts_to(
        "\n\n   <root>\n\t<b/>\n\n\t<a/>\n   </root>\n\n",
        "<root>\n    <a/>\n    <b/>\n</root>\n",
    );
}

#[test]
fn test_text_whitespace_kept_inside_content() {
    assert_sorts_to(
        "<r><t>  padded  text  </t></r>",
        "<r>\n    <t>  padded  text  </t>\n</r>\n",
    );
}

#[test]
fn test_entity_and_whitespace_preservation() {
    assert_sorts_to(
        "<r><e a=\"x &amp; y\" b=\"&lt;&quot;&gt;\">1 &lt; 2 &amp;&amp; 3 &gt; 2</e></r>",
        "<r>\n    <e a=\"x &amp; y\" b=\"&lt;&quot;&gt;\">1 &lt; 2 &amp;&amp; 3 &gt; 2</e>\n</r>\n",
    );
}

#[test]
fn test_character_references_resolved() {
    assert_sorts_to(
        "<r><e>&#65;&#x42;</e></r>",
        "<r>\n    <e>AB</e>\n</r>\n",
    );
}

#[test]
fn test_namespace_handling() {
    assert_sorts_to(
        r#"<root xmlns:b="urn:b" xmlns:a="urn:a"><b:item/><a:item/><item/></root>"#,
        "<root xmlns:a=\"urn:a\" xmlns:b=\"urn:b\">\n    <a:item/>\n    <b:item/>\n    <item/>\n</root>\n",
    );
}

#[test]
fn test_default_namespace_declaration_sorted_with_attributes() {
    assert_sorts_to(
        r#"<root xmlns="urn:d" id="1" xmlns:x="urn:x"><x:b/><a/></root>"#,
        "<root id=\"1\" xmlns=\"urn:d\" xmlns:x=\"urn:x\">\n    <a/>\n    <x:b/>\n</root>\n",
    );
}

// ---------------------------------------------------------------------------
// Declaration and output format
// ---------------------------------------------------------------------------

#[test]
fn test_output_formatting_with_declaration() {
    assert_sorts_to(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<r><b>t</b><a/></r>",
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<r>\n    <a/>\n    <b>t</b>\n</r>\n",
    );
}

#[test]
fn test_declaration_kept_verbatim() {
    assert_sorts_to(
        "<?xml version='1.0'   encoding='utf-8'?><r/>",
        "<?xml version='1.0'   encoding='utf-8'?>\n<r/>\n",
    );
}

#[test]
fn test_no_declaration_in_no_declaration_out() {
    assert_sorts_to("<r/>", "<r/>\n");
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn test_invalid_xml_handling() {
    for input in [
        "",
        "not xml",
        "<root>",
        "<root><a></root>",
        "<a/><b/>",
        "<r x=\"1\" x=\"2\"/>",
        "<r>&undefined;</r>",
        "<?xml version=\"1.0\"",
        "\u{A0}<r/>",
        "<r/>\u{2028}",
        "<r/>\u{85}",
        "\u{A0}<?xml version=\"1.0\"?><r/>",
        "<?xml version=\"1.0\"?>\u{3000}<r/>",
    ] {
        match sort_str(input) {
            Err(SortError::Parse(_)) => {}
            other => panic!("{input:?}: expected a parse error, got {other:?}"),
        }
    }
}

#[test]
fn test_error_message_has_location() {
    let err = sort_str("<r>\n<a>\n</r>").unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("error sorting XML content: parse error at 3:"), "{message}");
}
