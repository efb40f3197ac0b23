//! Removal of empty duplicates left behind by reconciliation.

use xmerge_tree::{Element, Node};

/// Remove every direct child of `parent` named `tag` that holds no data.
///
/// Only call this for a tag that was just duplicated under `parent`;
/// otherwise it would delete legitimately empty template fields.
/// Returns the number of children removed.
pub fn remove_empty(parent: &mut Element, tag: &str) -> usize {
    let before = parent.children.len();
    parent
        .children
        .retain(|child| !matches!(child, Node::Element(e) if e.name == tag && !e.has_data()));
    before - parent.children.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmerge_tree::Document;

    #[test]
    fn removes_only_empty_instances_of_the_tag() {
        let mut parent = Document::parse(
            "<r><X><a/></X><X><a>1</a></X><Y/><X>\n</X><X>v</X></r>",
        )
        .unwrap()
        .root;

        let removed = remove_empty(&mut parent, "X");

        assert_eq!(removed, 2);
        let kept: Vec<String> = parent.child_elements_named("X").map(Element::text_content).collect();
        assert_eq!(kept, vec!["1", "v"]);
        assert!(parent.first_child_named("Y").is_some());
    }

    #[test]
    fn nothing_to_remove() {
        let mut parent = Document::parse("<r><X>1</X></r>").unwrap().root;
        assert_eq!(remove_empty(&mut parent, "X"), 0);
        assert_eq!(remove_empty(&mut parent, "Missing"), 0);
    }
}
