//! Per-parent child index: tag name to the positions of matching children.
//!
//! A [`NodeIndex`] borrows the parent it was built from, so the borrow
//! checker refuses any structural mutation of that parent while the index is
//! alive. Callers that need to mutate copy the positions out, drop the index,
//! and rebuild it after the mutation.

use std::collections::HashMap;

use crate::node::{Element, Node};

/// Mapping from child tag name to the ordered positions (indices into
/// `parent.children`) of the direct element children with that tag.
///
/// Text, comment and other non-element children are not indexed.
#[derive(Debug)]
pub struct NodeIndex<'a> {
    parent: &'a Element,
    by_tag: HashMap<&'a str, Vec<usize>>,
    /// Tags in order of first appearance.
    order: Vec<&'a str>,
}

impl<'a> NodeIndex<'a> {
    /// Index the current children of `parent`.
    pub fn build(parent: &'a Element) -> Self {
        let mut by_tag: HashMap<&'a str, Vec<usize>> = HashMap::new();
        let mut order = Vec::new();

        for (position, child) in parent.children.iter().enumerate() {
            if let Node::Element(element) = child {
                let positions = by_tag.entry(element.name.as_str()).or_insert_with(|| {
                    order.push(element.name.as_str());
                    Vec::new()
                });
                positions.push(position);
            }
        }

        Self {
            parent,
            by_tag,
            order,
        }
    }

    /// Positions of the children named `tag`, in document order.
    pub fn positions(&self, tag: &str) -> &[usize] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Position of the first child named `tag`.
    pub fn first_position(&self, tag: &str) -> Option<usize> {
        self.positions(tag).first().copied()
    }

    /// Position of the last child named `tag`.
    pub fn last_position(&self, tag: &str) -> Option<usize> {
        self.positions(tag).last().copied()
    }

    /// The first child named `tag`.
    pub fn first(&self, tag: &str) -> Option<&'a Element> {
        let parent = self.parent;
        self.first_position(tag)
            .and_then(|p| parent.children[p].as_element())
    }

    /// All children named `tag`, in document order.
    pub fn elements(&self, tag: &str) -> impl Iterator<Item = &'a Element> + '_ {
        let parent = self.parent;
        self.positions(tag)
            .iter()
            .filter_map(move |&p| parent.children[p].as_element())
    }

    /// Number of children named `tag`.
    pub fn count(&self, tag: &str) -> usize {
        self.positions(tag).len()
    }

    /// Returns `true` if at least one child is named `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    /// Distinct child tags in order of first appearance.
    pub fn tags(&self) -> &[&'a str] {
        &self.order
    }

    /// Number of distinct child tags.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the parent has no element children.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
