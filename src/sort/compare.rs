//! Total orders over attributes and sibling elements.
//!
//! All string comparisons are by code point, i.e. the plain `Ord` of `str`.
//! Nothing here is locale-aware.

use std::cmp::Ordering;

use crate::tree::{Attribute, Document, NodeId, NodeKind};

/// Orders two attributes of one element by qualified name, then by value.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use xmlsorter::Attribute;
/// use xmlsorter::sort::compare_attributes;
///
/// let a = Attribute::new("id", "2");
/// let b = Attribute::new("class", "x");
/// assert_eq!(compare_attributes(&a, &b), Ordering::Greater);
/// ```
#[must_use]
pub fn compare_attributes(a: &Attribute, b: &Attribute) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.value.cmp(&b.value))
}

/// Orders two sibling elements.
///
/// The criteria are tried in turn and the first non-equal one decides:
///
/// 1. qualified tag name as written;
/// 2. the sorted lists of attribute names, compared lexicographically
///    (a strict prefix sorts first);
/// 3. attribute values, walked in sorted-name order;
/// 4. text content, see [`text_content`].
///
/// Elements equal on all four compare `Equal`; callers rely on a stable sort
/// to keep them in document order.
#[must_use]
pub fn compare_elements(doc: &Document, a: NodeId, b: NodeId) -> Ordering {
    let name_a = doc.node_name(a).unwrap_or_default();
    let name_b = doc.node_name(b).unwrap_or_default();
    name_a
        .cmp(name_b)
        .then_with(|| {
            let attrs_a = sorted_by_name(doc.attributes(a));
            let attrs_b = sorted_by_name(doc.attributes(b));
            compare_attribute_names(&attrs_a, &attrs_b)
                .then_with(|| compare_attribute_values(&attrs_a, &attrs_b))
        })
        .then_with(|| text_content(doc, a).cmp(&text_content(doc, b)))
}

fn sorted_by_name(attributes: &[Attribute]) -> Vec<&Attribute> {
    let mut sorted: Vec<&Attribute> = attributes.iter().collect();
    sorted.sort_by(|x, y| x.name.cmp(&y.name));
    sorted
}

fn compare_attribute_names(a: &[&Attribute], b: &[&Attribute]) -> Ordering {
    a.iter().map(|attr| &attr.name).cmp(b.iter().map(|attr| &attr.name))
}

/// Only reached when both name lists are identical, so the lists pair up.
fn compare_attribute_values(a: &[&Attribute], b: &[&Attribute]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.value.cmp(&y.value))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Builds the text used as the last ordering criterion.
///
/// It is the node's own value (always empty for elements) followed by the
/// values of its direct text and CDATA children. Those children are first
/// put in value order with a stable sort, so two elements holding the same
/// chunks in a different order compare equal here. Text nested in child
/// elements does not count.
#[must_use]
pub fn text_content(doc: &Document, id: NodeId) -> String {
    let mut chunks: Vec<&str> = doc
        .children(id)
        .filter_map(|child| match &doc.node(child).kind {
            NodeKind::Text { content } | NodeKind::CData { content } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    chunks.sort();

    let own = match &doc.node(id).kind {
        NodeKind::Element { .. } => None,
        _ => doc.node_text(id),
    };
    own.into_iter().chain(chunks).collect()
}
