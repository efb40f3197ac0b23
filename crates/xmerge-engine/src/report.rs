//! What a merge did: counters and non-fatal warnings.

use serde::{Deserialize, Serialize};

/// Summary of a single merge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Template elements the merger descended into.
    pub elements_visited: usize,
    /// Template elements whose own text was overwritten from the source.
    pub text_updates: usize,
    /// Anchor clones added by the reconciler.
    pub clones_added: usize,
    /// Empty instances removed by the cleanup pass.
    pub empty_removed: usize,
    /// Source subtrees imported verbatim because the template had no slot.
    pub subtrees_imported: usize,
    /// Flat-repeat instances imported from the source.
    pub flat_imported: usize,
    /// Template flat-repeat instances replaced by imported ones.
    pub flat_replaced: usize,
    /// Flat-repeat instances dropped as value duplicates.
    pub flat_deduplicated: usize,
    /// Non-fatal inconsistencies found along the way.
    pub warnings: Vec<MergeWarning>,
}

impl MergeReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the merge raised no warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Add another report's counters and warnings to this one.
    pub fn absorb(&mut self, other: &MergeReport) {
        self.elements_visited += other.elements_visited;
        self.text_updates += other.text_updates;
        self.clones_added += other.clones_added;
        self.empty_removed += other.empty_removed;
        self.subtrees_imported += other.subtrees_imported;
        self.flat_imported += other.flat_imported;
        self.flat_replaced += other.flat_replaced;
        self.flat_deduplicated += other.flat_deduplicated;
        self.warnings.extend(other.warnings.iter().cloned());
    }
}

/// A non-fatal inconsistency between the configuration, the template, and
/// the source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergeWarning {
    /// An unbounded tag needed more instances but the template had none to
    /// clone. The source instances were imported verbatim instead.
    MissingAnchor { path: String, tag: String },
    /// A non-repeating tag occurred several times under one source parent;
    /// all occurrences merged into the same template element.
    RepeatedBoundedTag {
        path: String,
        tag: String,
        occurrences: usize,
    },
    /// The two documents have different root element names.
    RootMismatch { template: String, source: String },
}

impl std::fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAnchor { path, tag } => {
                write!(f, "{path}: no <{tag}> in template to duplicate; imported source instances")
            }
            Self::RepeatedBoundedTag {
                path,
                tag,
                occurrences,
            } => write!(
                f,
                "{path}: non-repeating <{tag}> appears {occurrences} times in source; later values win"
            ),
            Self::RootMismatch { template, source } => {
                write!(f, "root mismatch: template <{template}>, source <{source}>")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_sums_counters_and_keeps_warnings() {
        let mut total = MergeReport::new();
        let one = MergeReport {
            clones_added: 2,
            empty_removed: 1,
            warnings: vec![MergeWarning::MissingAnchor {
                path: "/r".into(),
                tag: "X".into(),
            }],
            ..Default::default()
        };
        total.absorb(&one);
        total.absorb(&one);
        assert_eq!(total.clones_added, 4);
        assert_eq!(total.empty_removed, 2);
        assert_eq!(total.warnings.len(), 2);
        assert!(!total.is_clean());
    }

    #[test]
    fn warnings_serialize_with_kind_tag() {
        let w = MergeWarning::RootMismatch {
            template: "a".into(),
            source: "b".into(),
        };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["kind"], "root_mismatch");
        assert_eq!(w.to_string(), "root mismatch: template <a>, source <b>");
    }
}
