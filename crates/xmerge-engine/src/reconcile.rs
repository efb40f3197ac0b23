//! Cardinality reconciliation for unbounded tags.
//!
//! Grows the template side of one unbounded tag until it has at least as
//! many instances as the source has data-bearing instances. Never removes
//! anything; see [`crate::cleanup`] for that.

use tracing::debug;
use xmerge_tree::{Element, Node, NodeIndex};

use crate::error::ReconcileError;

/// The result of reconciling one tag under one parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    /// The reconciled tag.
    pub tag: String,
    /// Data-bearing source instances.
    pub source_count: usize,
    /// Data-bearing template instances before duplication.
    pub template_count: usize,
    /// Anchor clones added to the template.
    pub added: usize,
}

impl Reconciliation {
    /// Returns `true` if clones were added, which makes a cleanup pass
    /// necessary afterwards.
    pub fn duplicated(&self) -> bool {
        self.added > 0
    }
}

/// Number of direct children of `parent` named `tag` that hold data.
pub fn count_data_bearing(parent: &Element, tag: &str) -> usize {
    parent
        .child_elements_named(tag)
        .filter(|e| e.has_data())
        .count()
}

/// Duplicate the template's first `tag` instance until the template has as
/// many data-bearing-capable slots as the source has data-bearing instances.
///
/// Clones are deep copies (structure and default values) inserted directly
/// after the last existing `tag` sibling.
///
/// Fails with [`ReconcileError::MissingAnchor`] only when duplication is
/// needed and the template has no `tag` child at all.
pub fn reconcile(
    template: &mut Element,
    source: &Element,
    tag: &str,
) -> Result<Reconciliation, ReconcileError> {
    let source_count = count_data_bearing(source, tag);
    let template_count = count_data_bearing(template, tag);

    let mut result = Reconciliation {
        tag: tag.to_string(),
        source_count,
        template_count,
        added: 0,
    };
    if source_count <= template_count {
        return Ok(result);
    }

    let index = NodeIndex::build(template);
    let (anchor, last) = match (index.first(tag), index.last_position(tag)) {
        (Some(anchor), Some(last)) => (anchor.clone(), last),
        _ => {
            return Err(ReconcileError::MissingAnchor {
                tag: tag.to_string(),
            })
        }
    };

    let missing = source_count - template_count;
    let clones = std::iter::repeat_with(|| Node::Element(anchor.clone())).take(missing);
    let at = last + 1;
    template.children.splice(at..at, clones);
    result.added = missing;

    debug!(
        tag,
        source_count, template_count, added = missing, "duplicated unbounded field"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmerge_tree::Document;

    fn root(xml: &str) -> Element {
        Document::parse(xml).unwrap().root
    }

    fn names(e: &Element) -> Vec<&str> {
        e.child_elements().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn counts_only_data_bearing_instances() {
        let source = root("<r><X><a>1</a></X><X><a> </a></X><X/><X>v</X><Y>2</Y></r>");
        assert_eq!(count_data_bearing(&source, "X"), 2);
        assert_eq!(count_data_bearing(&source, "Y"), 1);
        assert_eq!(count_data_bearing(&source, "Z"), 0);
    }

    #[test]
    fn grows_template_to_source_count() {
        let mut template = root("<r><X><a/><b>def</b></X><Y/></r>");
        let source = root("<r><X><a>1</a></X><X><a>2</a></X><X><a>3</a></X></r>");

        let rec = reconcile(&mut template, &source, "X").unwrap();

        // The anchor has a default value so it already counts as one.
        assert_eq!(rec.template_count, 1);
        assert_eq!(rec.source_count, 3);
        assert_eq!(rec.added, 2);
        assert!(rec.duplicated());
        assert_eq!(names(&template), vec!["X", "X", "X", "Y"]);
        for x in template.child_elements_named("X") {
            assert_eq!(x.first_child_named("b").map(Element::own_text), Some("def".into()));
        }
    }

    #[test]
    fn empty_anchor_counts_as_zero() {
        let mut template = root("<r><X/></r>");
        let source = root("<r><X>A</X><X>B</X></r>");
        let rec = reconcile(&mut template, &source, "X").unwrap();
        assert_eq!(rec.template_count, 0);
        assert_eq!(rec.added, 2);
        assert_eq!(template.child_elements_named("X").count(), 3);
    }

    #[test]
    fn no_duplication_when_template_suffices() {
        let mut template = root("<r><X>a</X><X>b</X></r>");
        let source = root("<r><X>c</X></r>");
        let before = template.clone();
        let rec = reconcile(&mut template, &source, "X").unwrap();
        assert!(!rec.duplicated());
        assert_eq!(template, before);
    }

    #[test]
    fn all_empty_source_is_a_no_op() {
        let mut template = root("<r><X><a/></X></r>");
        let source = root("<r><X><a/></X><X><a>  </a></X></r>");
        let rec = reconcile(&mut template, &source, "X").unwrap();
        assert_eq!(rec.source_count, 0);
        assert_eq!(rec.added, 0);
    }

    #[test]
    fn missing_anchor_is_reported() {
        let mut template = root("<r><Y/></r>");
        let source = root("<r><X>1</X></r>");
        let err = reconcile(&mut template, &source, "X").unwrap_err();
        assert_eq!(err, ReconcileError::MissingAnchor { tag: "X".into() });
        assert_eq!(names(&template), vec!["Y"]);
    }

    #[test]
    fn missing_anchor_without_source_data_is_fine() {
        let mut template = root("<r><Y/></r>");
        let source = root("<r><X/></r>");
        assert!(reconcile(&mut template, &source, "X").is_ok());
    }

    #[test]
    fn clones_follow_the_last_existing_instance() {
        let mut template = root("<r><A/><X/><B/><X/><C/></r>");
        let source = root("<r><X>1</X><X>2</X><X>3</X></r>");
        reconcile(&mut template, &source, "X").unwrap();
        assert_eq!(names(&template), vec!["A", "X", "B", "X", "X", "X", "X", "C"]);
    }
}
