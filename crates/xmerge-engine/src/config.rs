//! Merge configuration: which tags may repeat, and which of those are flat.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use xmerge_tree::{Document, Element};

use crate::error::{ConfigError, ConfigResult};

/// Static configuration supplied to a [`Merger`](crate::Merger).
///
/// Loaded once per job and shared read-only between merges.
///
/// ```toml
/// unbounded = ["CollateralDetail", "ALSCustomerNum"]
/// flat_repeat = ["ALSCustomerNum"]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Tags for which several concurrent instances are schema-legal.
    pub unbounded: BTreeSet<String>,
    /// Unbounded tags without substructure, merged by value de-duplication.
    pub flat_repeat: BTreeSet<String>,
}

impl MergeConfig {
    /// An empty configuration: every tag is treated as non-repeating.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: mark tags as unbounded.
    pub fn with_unbounded<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unbounded.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Builder: mark tags as flat-repeat. They are also added to the
    /// unbounded set.
    pub fn with_flat_repeat<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            self.unbounded.insert(tag.clone());
            self.flat_repeat.insert(tag);
        }
        self
    }

    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&input)?;
        tracing::debug!(
            path = %path.display(),
            unbounded = config.unbounded.len(),
            flat_repeat = config.flat_repeat.len(),
            "loaded merge configuration"
        );
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string(self)?)
    }

    /// Check that tag names are non-empty and that every flat-repeat tag is
    /// also unbounded.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.unbounded.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::EmptyTag("unbounded"));
        }
        if self.flat_repeat.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::EmptyTag("flat_repeat"));
        }
        if let Some(tag) = self.flat_repeat.difference(&self.unbounded).next() {
            return Err(ConfigError::FlatRepeatNotUnbounded(tag.clone()));
        }
        Ok(())
    }

    /// Returns `true` if `tag` may repeat.
    pub fn is_unbounded(&self, tag: &str) -> bool {
        self.unbounded.contains(tag)
    }

    /// Returns `true` if `tag` is merged by value de-duplication.
    pub fn is_flat_repeat(&self, tag: &str) -> bool {
        self.flat_repeat.contains(tag)
    }

    /// Unbounded tags that never occur anywhere in `template`.
    ///
    /// Such tags can never be duplicated; callers log them as configuration
    /// inconsistencies.
    pub fn missing_from(&self, template: &Document) -> Vec<String> {
        let mut present = HashSet::new();
        collect_names(&template.root, &mut present);
        self.unbounded
            .iter()
            .filter(|tag| !present.contains(tag.as_str()))
            .cloned()
            .collect()
    }
}

fn collect_names<'a>(element: &'a Element, names: &mut HashSet<&'a str>) {
    names.insert(element.name.as_str());
    for child in element.child_elements() {
        collect_names(child, names);
    }
}
