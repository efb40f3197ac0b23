use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use xmerge_tree::TreeError;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("cannot load template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: TreeError,
    },

    #[error("cannot read source directory {path}: {source}")]
    SourceDir {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("cannot load source {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: TreeError,
    },

    #[error("cannot write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: TreeError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("merge of {path} exceeded {limit:?}")]
    Timeout { path: PathBuf, limit: Duration },

    #[error("worker for {path} failed: {message}")]
    Worker { path: PathBuf, message: String },
}

pub type BatchResult<T> = Result<T, BatchError>;
