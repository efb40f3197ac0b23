//! Whitelist discovery from schema-annotated templates.
//!
//! Templates exported from schema tooling mark repeatable fields with a
//! comment directly in front of them:
//!
//! ```xml
//! <!--Zero or more repetitions:-->
//! <CollateralDetail>...</CollateralDetail>
//! ```
//!
//! This is offline tooling. The merge itself never looks at comments.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;
use xmerge_tree::{Document, Element, Node};

use crate::config::MergeConfig;

/// Marker texts recognized when no others are configured.
pub const DEFAULT_MARKERS: &[&str] = &["Zero or more repetitions:", "1 or more repetitions:"];

/// Options for [`discover_unbounded`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Comment substrings that mark the next element as repeatable.
    pub markers: Vec<String>,
    /// Also report discovered tags that never have element children as
    /// flat-repeat.
    pub flat_leaves: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
            flat_leaves: false,
        }
    }
}

impl DiscoveryOptions {
    fn is_marker(&self, comment: &str) -> bool {
        self.markers.iter().any(|m| comment.contains(m.as_str()))
    }
}

/// Scan `template` for marker comments and build a configuration listing
/// every marked tag as unbounded.
///
/// A marker applies to the next element sibling. Whitespace and other
/// comments in between do not cancel it; non-blank text does.
pub fn discover_unbounded(template: &Document, options: &DiscoveryOptions) -> MergeConfig {
    let mut marked = BTreeSet::new();
    let mut structured = HashSet::new();
    scan(&template.root, options, &mut marked, &mut structured);

    let mut config = MergeConfig::new().with_unbounded(marked.iter().cloned());
    if options.flat_leaves {
        let leaves: Vec<String> = marked
            .iter()
            .filter(|tag| !structured.contains(tag.as_str()))
            .cloned()
            .collect();
        config = config.with_flat_repeat(leaves);
    }

    debug!(
        unbounded = config.unbounded.len(),
        flat_repeat = config.flat_repeat.len(),
        "discovered repeatable fields"
    );
    config
}

fn scan<'a>(
    element: &'a Element,
    options: &DiscoveryOptions,
    marked: &mut BTreeSet<String>,
    structured: &mut HashSet<&'a str>,
) {
    if element.has_element_children() {
        structured.insert(element.name.as_str());
    }

    let mut pending = false;
    for child in &element.children {
        match child {
            Node::Comment(text) if options.is_marker(text) => pending = true,
            Node::Element(e) => {
                if std::mem::take(&mut pending) {
                    marked.insert(e.name.clone());
                }
                scan(e, options, marked, structured);
            }
            Node::Text(_) | Node::CData(_) if !child.is_whitespace() => pending = false,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANNOTATED: &str = r#"<Contract>
  <Header>
    <No>?</No>
    <!--Zero or more repetitions:-->
    <ALSCustomerNum>?</ALSCustomerNum>
  </Header>
  <!--Zero or more repetitions:-->
  <!--Optional:-->
  <CollateralDetail>
    <Type>?</Type>
    <!--1 or more repetitions:-->
    <Owner><Name>?</Name></Owner>
  </CollateralDetail>
  <!--Optional:-->
  <Footer/>
</Contract>"#;

    fn set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn finds_marked_elements_at_any_depth() {
        let doc = Document::parse(ANNOTATED).unwrap();
        let config = discover_unbounded(&doc, &DiscoveryOptions::default());
        assert_eq!(
            config.unbounded,
            set(&["ALSCustomerNum", "CollateralDetail", "Owner"])
        );
        assert!(config.flat_repeat.is_empty());
    }

    #[test]
    fn flat_leaves_excludes_structured_tags() {
        let doc = Document::parse(ANNOTATED).unwrap();
        let options = DiscoveryOptions {
            flat_leaves: true,
            ..Default::default()
        };
        let config = discover_unbounded(&doc, &options);
        assert_eq!(config.flat_repeat, set(&["ALSCustomerNum"]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn marker_only_applies_to_next_element() {
        let doc = Document::parse(
            "<r><!--Zero or more repetitions:--><a/><b/>\
             <!--Zero or more repetitions:-->text<c/></r>",
        )
        .unwrap();
        let config = discover_unbounded(&doc, &DiscoveryOptions::default());
        assert_eq!(config.unbounded, set(&["a"]));
    }

    #[test]
    fn custom_markers() {
        let doc = Document::parse("<r><!-- @repeat --><a/><!--Zero or more repetitions:--><b/></r>").unwrap();
        let options = DiscoveryOptions {
            markers: vec!["@repeat".into()],
            flat_leaves: false,
        };
        assert_eq!(discover_unbounded(&doc, &options).unbounded, set(&["a"]));
    }

    #[test]
    fn discovered_config_round_trips_through_toml() {
        let doc = Document::parse(ANNOTATED).unwrap();
        let config = discover_unbounded(&doc, &DiscoveryOptions::default());
        let text = config.to_toml_string().unwrap();
        assert_eq!(MergeConfig::from_toml_str(&text).unwrap(), config);
    }
}
