//! In-place recursive canonicalization of an element subtree.
//!
//! Every element gets its attributes sorted and its element children put in
//! [`compare_elements`] order. Comments, processing instructions, CDATA, and
//! non-blank text are not sorted themselves: each run of them travels with
//! the element that follows it, and a run after the last element stays last.
//! Whitespace-only text is dropped.

use std::collections::HashMap;

use log::trace;

use super::compare::{compare_attributes, compare_elements};
use crate::tree::{Document, NodeId};

/// Canonicalizes the subtree rooted at `node`.
///
/// Non-element nodes are left untouched. Recursion depth equals the element
/// nesting depth of the subtree.
pub fn canonicalize(doc: &mut Document, node: NodeId) {
    if !doc.node(node).kind.is_element() {
        return;
    }

    sort_attributes(doc, node);

    let Partition {
        elements,
        mut anchors,
        trailing,
    } = partition_children(doc, node);

    for &child in &elements {
        canonicalize(doc, child);
    }

    let mut sorted = elements;
    // `sort_by` is stable: equal siblings keep document order.
    sorted.sort_by(|&a, &b| compare_elements(doc, a, b));

    doc.detach_children(node);
    for element in sorted {
        if let Some(run) = anchors.remove(&element) {
            for anchored in run {
                doc.append_child(node, anchored);
            }
        }
        doc.append_child(node, element);
    }
    for node_id in trailing {
        doc.append_child(node, node_id);
    }
}

fn sort_attributes(doc: &mut Document, node: NodeId) {
    if doc.attributes(node).len() < 2 {
        return;
    }
    let mut attributes = doc.take_attributes(node);
    attributes.sort_by(compare_attributes);
    doc.set_attributes(node, attributes);
}

/// The children of one element, split up for reassembly.
#[derive(Debug, Default)]
struct Partition {
    /// Element children in document order.
    elements: Vec<NodeId>,
    /// The non-element run that directly preceded each element.
    anchors: HashMap<NodeId, Vec<NodeId>>,
    /// Non-element children after the last element.
    trailing: Vec<NodeId>,
}

/// Splits the children of `node` into elements, anchor runs, and the
/// trailing run. Whitespace-only text children are detached here and do not
/// appear in the result.
fn partition_children(doc: &mut Document, node: NodeId) -> Partition {
    let mut partition = Partition::default();
    let mut run = Vec::new();

    let children: Vec<NodeId> = doc.children(node).collect();
    for child in children {
        let kind = &doc.node(child).kind;
        if kind.is_blank_text() {
            doc.detach(child);
        } else if kind.is_element() {
            if !run.is_empty() {
                trace!("anchoring {} node(s) to element {child:?}", run.len());
                partition
                    .anchors
                    .insert(child, std::mem::take(&mut run));
            }
            partition.elements.push(child);
        } else {
            run.push(child);
        }
    }
    partition.trailing = run;
    partition
}
