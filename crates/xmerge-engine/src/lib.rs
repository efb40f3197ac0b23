//! Template merge engine for xmerge.
//!
//! Merges a user-filled *source* document into a canonical *template*
//! document. The output keeps the template's structure and ordering, copies
//! leaf values over from the source, and repeats the template's
//! whitelisted ("unbounded") fields as often as the source has data for.
//!
//! # Key Types
//!
//! - [`Merger`] / [`MergeOutcome`] -- the recursive merge entry point
//! - [`MergeConfig`] -- unbounded and flat-repeat tag sets
//! - [`Reconciliation`] -- per-tag duplication result
//! - [`MergeReport`] / [`MergeWarning`] -- what a merge did
//! - [`discover_unbounded`] -- derive a whitelist from marker comments
//!
//! # Merge Rules
//!
//! 1. Ordinary tags merge into the single matching template child, or are
//!    imported verbatim when the template has no such child.
//! 2. Unbounded tags are reconciled by count of data-bearing instances, then
//!    paired positionally with the source.
//! 3. Flat-repeat tags replace the template's instances wholesale and are
//!    de-duplicated by value.
//! 4. Empty duplicates are removed only where duplication happened.

pub mod cleanup;
pub mod config;
pub mod discover;
pub mod error;
pub mod flat;
pub mod merger;
pub mod reconcile;
pub mod report;

pub use cleanup::remove_empty;
pub use config::MergeConfig;
pub use discover::{discover_unbounded, DiscoveryOptions, DEFAULT_MARKERS};
pub use error::{ConfigError, ConfigResult, ReconcileError};
pub use flat::{dedupe_by_value, merge_flat, FlatMerge};
pub use merger::{MergeOutcome, Merger};
pub use reconcile::{count_data_bearing, reconcile, Reconciliation};
pub use report::{MergeReport, MergeWarning};
