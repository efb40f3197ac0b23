use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use xmerge_engine::MergeReport;

/// A source that merged and was written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    pub report: MergeReport,
}

/// A source that could not be merged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub source: PathBuf,
    pub error: String,
}

/// Result of a whole batch, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub merged: Vec<FileOutcome>,
    pub failures: Vec<FileFailure>,
    /// Counters and warnings summed over every merged file.
    pub totals: MergeReport,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no file failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of sources attempted.
    pub fn processed(&self) -> usize {
        self.merged.len() + self.failures.len()
    }

    pub(crate) fn record(&mut self, outcome: FileOutcome) {
        self.totals.absorb(&outcome.report);
        self.merged.push(outcome);
    }

    pub(crate) fn fail(&mut self, source: PathBuf, error: impl ToString) {
        self.failures.push(FileFailure {
            source,
            error: error.to_string(),
        });
    }
}
