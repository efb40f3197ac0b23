//! Directory batch driver for xmerge.
//!
//! Merges every XML file in a source directory into one shared template and
//! writes one output file per source. Each file is an independent merge:
//! a malformed source is recorded as a failure and the batch moves on.
//!
//! # Key Types
//!
//! - [`BatchConfig`] -- paths, naming, and concurrency settings
//! - [`run_batch`] -- the async driver
//! - [`BatchReport`] -- per-file outcomes and aggregated counters
//! - [`BatchError`] -- fatal setup errors and per-file failure causes

pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod sources;

pub use config::{BatchConfig, DEFAULT_PREFIX};
pub use error::{BatchError, BatchResult};
pub use report::{BatchReport, FileFailure, FileOutcome};
pub use runner::run_batch;
pub use sources::{collect_sources, output_path};
