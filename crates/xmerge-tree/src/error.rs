//! Error types for the tree crate.

use std::path::PathBuf;

/// Errors that can occur while reading or writing documents.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The input is not well-formed XML.
    #[error("parse error at byte {position}: {message}")]
    Parse { position: u64, message: String },

    /// The input contains no root element.
    #[error("document has no root element")]
    NoRoot,

    /// The input contains more than one top-level element.
    #[error("document has more than one root element (second root: <{0}>)")]
    MultipleRoots(String),

    /// Input or serialized output was not valid UTF-8.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The XML writer failed.
    #[error("write error: {0}")]
    Write(String),

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TreeError {
    pub(crate) fn parse(position: u64, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            position,
            message: message.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
