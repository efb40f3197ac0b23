//! Flat-repeat fields: repeated leaves merged by value instead of position.

use std::collections::HashSet;

use xmerge_tree::{Element, Node, NodeIndex};

/// Counters from one flat-repeat merge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlatMerge {
    /// Source instances imported into the template.
    pub imported: usize,
    /// Template instances replaced by the imported ones.
    pub replaced: usize,
    /// Instances removed as value duplicates.
    pub deduplicated: usize,
}

/// Replace the template's `tag` instances with every data-bearing `tag`
/// instance of `source`, then drop value duplicates.
///
/// Imports take the place of the template's instances, or go at the end if
/// there are none. A source without data-bearing instances leaves the
/// template untouched, default values included.
pub fn merge_flat(template: &mut Element, source: &Element, tag: &str) -> FlatMerge {
    let incoming: Vec<Node> = source
        .child_elements_named(tag)
        .filter(|e| e.has_data())
        .cloned()
        .map(Node::Element)
        .collect();
    if incoming.is_empty() {
        return FlatMerge::default();
    }
    let imported = incoming.len();

    let originals = NodeIndex::build(template).positions(tag).to_vec();
    let at = originals.last().map_or(template.children.len(), |last| last + 1);
    template.children.splice(at..at, incoming);

    // Originals all sit before the splice point, so their positions hold.
    let mut position = 0;
    template.children.retain(|_| {
        let keep = originals.binary_search(&position).is_err();
        position += 1;
        keep
    });

    FlatMerge {
        imported,
        replaced: originals.len(),
        deduplicated: dedupe_by_value(template, tag),
    }
}

/// Remove later data-bearing `tag` children whose trimmed text equals an
/// earlier one's. First occurrence wins; order is otherwise unchanged.
///
/// Returns the number of children removed.
pub fn dedupe_by_value(parent: &mut Element, tag: &str) -> usize {
    let before = parent.children.len();
    let mut seen = HashSet::new();
    parent.children.retain(|child| match child {
        Node::Element(e) if e.name == tag && e.has_data() => {
            seen.insert(e.text_content().trim().to_string())
        }
        _ => true,
    });
    before - parent.children.len()
}
