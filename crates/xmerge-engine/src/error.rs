//! Error types for the merge engine.

use std::path::PathBuf;

/// Errors from loading or validating a [`MergeConfig`](crate::MergeConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML.
    #[error("cannot serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A flat-repeat tag is missing from the unbounded set.
    #[error("flat-repeat tag {0:?} is not listed as unbounded")]
    FlatRepeatNotUnbounded(String),

    /// A tag name is empty or whitespace.
    #[error("empty tag name in {0}")]
    EmptyTag(&'static str),
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from the cardinality reconciler.
///
/// These describe inconsistencies between the whitelist and the template.
/// The merger reports them as warnings and keeps going.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// Duplication was needed but the template has no instance to clone.
    #[error("template has no <{tag}> instance to duplicate")]
    MissingAnchor { tag: String },
}
