//! The recursive merger: walks the source alongside the template and fills
//! the template in.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};
use xmerge_tree::{Document, Element, Node, NodeIndex};

use crate::cleanup::remove_empty;
use crate::config::MergeConfig;
use crate::flat::merge_flat;
use crate::reconcile::{reconcile, Reconciliation};
use crate::report::{MergeReport, MergeWarning};

/// The merged document together with what happened while producing it.
#[derive(Clone, Debug)]
pub struct MergeOutcome {
    pub document: Document,
    pub report: MergeReport,
}

/// Merges source documents into templates under a fixed configuration.
///
/// A `Merger` holds no per-merge state, so one instance can serve many
/// merges, including concurrent ones on separate template copies.
#[derive(Clone, Debug, Default)]
pub struct Merger {
    config: MergeConfig,
}

impl Merger {
    /// Create a merger for the given configuration.
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merge `source` into `template` and return the result.
    ///
    /// The template is consumed; callers merging many sources against one
    /// template pass a fresh clone each time. The root elements are merged
    /// with each other even if their names differ (reported as a warning).
    pub fn merge(&self, template: Document, source: &Document) -> MergeOutcome {
        let mut document = template;
        let mut walk = Walk::new(&document.root.name);

        if document.root.name != source.root.name {
            warn!(
                template = %document.root.name,
                source = %source.root.name,
                "root element names differ"
            );
            walk.report.warnings.push(MergeWarning::RootMismatch {
                template: document.root.name.clone(),
                source: source.root.name.clone(),
            });
        }

        self.merge_element(&mut document.root, &source.root, &mut walk);

        MergeOutcome {
            document,
            report: walk.report,
        }
    }

    /// Merge the children and text of `source` into `template`, recursively.
    fn merge_element(&self, template: &mut Element, source: &Element, walk: &mut Walk) {
        walk.report.elements_visited += 1;

        let mut reconciled: HashSet<&str> = HashSet::new();
        let mut bounded: BTreeMap<&str, usize> = BTreeMap::new();
        let mut lookup = ChildLookup::default();

        for child in &source.children {
            match child {
                Node::Element(src) if self.config.is_unbounded(&src.name) => {
                    // All instances are handled together on first sight.
                    if reconciled.insert(src.name.as_str()) {
                        self.merge_unbounded(template, source, &src.name, walk);
                        lookup.invalidate();
                    }
                }
                Node::Element(src) => {
                    *bounded.entry(src.name.as_str()).or_default() += 1;
                    self.merge_bounded(template, src, &mut lookup, walk);
                }
                Node::Text(text) | Node::CData(text) => {
                    let value = text.trim();
                    if !value.is_empty() {
                        template.set_text(value);
                        lookup.invalidate();
                        walk.report.text_updates += 1;
                    }
                }
                _ => {}
            }
        }

        for (tag, occurrences) in bounded.into_iter().filter(|(_, n)| *n > 1) {
            let path = walk.path();
            warn!(%path, tag, occurrences, "non-repeating tag repeated in source");
            walk.report.warnings.push(MergeWarning::RepeatedBoundedTag {
                path,
                tag: tag.to_string(),
                occurrences,
            });
        }
    }

    /// An ordinary tag: recurse into the matching template child, or import
    /// the source subtree if the template has none.
    fn merge_bounded(
        &self,
        template: &mut Element,
        src: &Element,
        lookup: &mut ChildLookup,
        walk: &mut Walk,
    ) {
        let position = lookup.first_position(template, &src.name);
        if let Some(target) = position.and_then(|p| template.child_element_mut(p)) {
            walk.enter(&src.name);
            self.merge_element(target, src, walk);
            walk.leave();
            return;
        }

        debug!(path = %walk.path(), tag = %src.name, "importing subtree absent from template");
        template.children.push(Node::Element(src.clone()));
        lookup.appended(&src.name, template.children.len() - 1);
        walk.report.subtrees_imported += 1;
    }

    /// An unbounded tag: reconcile counts, fill the instances, then drop
    /// empty leftovers if anything was duplicated. Flat-repeat tags skip
    /// reconciliation and replace the template's instances by value.
    fn merge_unbounded(&self, template: &mut Element, source: &Element, tag: &str, walk: &mut Walk) {
        if self.config.is_flat_repeat(tag) {
            let flat = merge_flat(template, source, tag);
            walk.report.flat_imported += flat.imported;
            walk.report.flat_replaced += flat.replaced;
            walk.report.flat_deduplicated += flat.deduplicated;
            return;
        }

        let reconciliation = match reconcile(template, source, tag) {
            Ok(rec) => {
                walk.report.clones_added += rec.added;
                Some(rec)
            }
            Err(err) => {
                let path = walk.path();
                warn!(%path, error = %err, "unbounded field has no anchor in template");
                walk.report.warnings.push(MergeWarning::MissingAnchor {
                    path,
                    tag: tag.to_string(),
                });
                None
            }
        };

        self.merge_positionally(template, source, tag, walk);

        if reconciliation.as_ref().is_some_and(Reconciliation::duplicated) {
            walk.report.empty_removed += remove_empty(template, tag);
        }
    }

    /// Pair the i-th data-bearing source instance with the i-th template
    /// instance. Source instances without a partner are imported.
    fn merge_positionally(&self, template: &mut Element, source: &Element, tag: &str, walk: &mut Walk) {
        let mut slots = NodeIndex::build(template).positions(tag).to_vec().into_iter();
        let mut overflow = Vec::new();

        for src in source.child_elements_named(tag).filter(|e| e.has_data()) {
            match slots.next().and_then(|p| template.child_element_mut(p)) {
                Some(target) => {
                    walk.enter(tag);
                    self.merge_element(target, src, walk);
                    walk.leave();
                }
                None => overflow.push(Node::Element(src.clone())),
            }
        }

        if !overflow.is_empty() {
            walk.report.subtrees_imported += overflow.len();
            template.children.extend(overflow);
        }
    }
}

/// First position of each tag among one template parent's children.
///
/// Built on first use and kept while the child list only changes at the
/// end. Any other mutation of the child list must invalidate it.
#[derive(Default)]
struct ChildLookup {
    first: Option<HashMap<String, usize>>,
}

impl ChildLookup {
    fn first_position(&mut self, parent: &Element, tag: &str) -> Option<usize> {
        let first = self.first.get_or_insert_with(|| {
            let index = NodeIndex::build(parent);
            index
                .tags()
                .iter()
                .filter_map(|t| index.first_position(t).map(|p| (t.to_string(), p)))
                .collect()
        });
        first.get(tag).copied()
    }

    /// Record a child pushed at `position`, the current end of the list.
    fn appended(&mut self, tag: &str, position: usize) {
        if let Some(first) = self.first.as_mut() {
            first.entry(tag.to_string()).or_insert(position);
        }
    }

    fn invalidate(&mut self) {
        self.first = None;
    }
}

/// Per-merge traversal state.
struct Walk {
    path: Vec<String>,
    report: MergeReport,
}

impl Walk {
    fn new(root: &str) -> Self {
        Self {
            path: vec![root.to_string()],
            report: MergeReport::new(),
        }
    }

    fn enter(&mut self, tag: &str) {
        self.path.push(tag.to_string());
    }

    fn leave(&mut self) {
        self.path.pop();
    }

    fn path(&self) -> String {
        format!("/{}", self.path.join("/"))
    }
}
