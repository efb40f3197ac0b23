use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use xmerge_tree::WriteOptions;

/// File name prefix for merged outputs.
pub const DEFAULT_PREFIX: &str = "Merged_";

/// Settings for one batch run.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// The template every source is merged into.
    pub template: PathBuf,
    /// Directory holding the source documents.
    pub sources: PathBuf,
    /// Directory the merged documents are written to. Created if missing.
    pub output: PathBuf,
    /// Maximum number of merges running at once.
    pub jobs: usize,
    /// Per-file limit; a file that exceeds it is recorded as failed.
    pub timeout: Option<Duration>,
    /// Prepended to each source file name to form the output name.
    pub prefix: String,
    /// Walk subdirectories of `sources`, mirroring them under `output`.
    pub recursive: bool,
    pub write: WriteOptions,
}

impl BatchConfig {
    pub fn new(
        template: impl Into<PathBuf>,
        sources: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template: template.into(),
            sources: sources.into(),
            output: output.into(),
            jobs: default_jobs(),
            timeout: None,
            prefix: DEFAULT_PREFIX.to_string(),
            recursive: false,
            write: WriteOptions::default(),
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_write_options(mut self, write: WriteOptions) -> Self {
        self.write = write;
        self
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
