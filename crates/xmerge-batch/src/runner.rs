//! The async batch driver.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use xmerge_engine::Merger;
use xmerge_tree::{Document, WriteOptions};

use crate::config::BatchConfig;
use crate::error::{BatchError, BatchResult};
use crate::report::{BatchReport, FileOutcome};
use crate::sources::{collect_sources, output_path};

/// Merge every source in `config.sources` into the template and write the
/// results to `config.output`.
///
/// Fails only if the template, the source directory, or the output
/// directory is unusable. Per-file problems end up in
/// [`BatchReport::failures`].
pub async fn run_batch(merger: Merger, config: &BatchConfig) -> BatchResult<BatchReport> {
    let template = load_template(&config.template).await?;
    for tag in merger.config().missing_from(&template) {
        warn!(%tag, "unbounded tag never occurs in template");
    }

    let exclude = config.recursive.then_some(config.output.as_path());
    let sources = collect_sources(&config.sources, config.recursive, exclude)?;
    tokio::fs::create_dir_all(&config.output)
        .await
        .map_err(|source| BatchError::Io {
            path: config.output.clone(),
            source,
        })?;

    info!(
        sources = sources.len(),
        jobs = config.jobs,
        dir = %config.sources.display(),
        "starting batch"
    );

    let template = Arc::new(template);
    let merger = Arc::new(merger);
    let permits = Arc::new(Semaphore::new(config.jobs.max(1)));
    let mut pending = Vec::with_capacity(sources.len());

    for source in sources {
        let permit = permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| BatchError::Worker {
                path: source.clone(),
                message: e.to_string(),
            })?;

        let output = output_path(config, &source);
        let abandoned = Arc::new(AtomicBool::new(false));
        let job = Job {
            merger: Arc::clone(&merger),
            template: Arc::clone(&template),
            source: source.clone(),
            output,
            write: config.write.clone(),
            abandoned: Arc::clone(&abandoned),
        };

        let work = tokio::task::spawn_blocking(move || job.run());
        let supervisor = tokio::spawn(supervise(
            source.clone(),
            work,
            config.timeout,
            abandoned,
            permit,
        ));
        pending.push((source, supervisor));
    }

    let mut report = BatchReport::new();
    for (source, supervisor) in pending {
        let result = match supervisor.await {
            Ok(result) => result,
            Err(e) => Err(BatchError::Worker {
                path: source.clone(),
                message: e.to_string(),
            }),
        };
        match result {
            Ok(outcome) => report.record(outcome),
            Err(err) => {
                warn!(source = %source.display(), error = %err, "merge failed");
                report.fail(source, err);
            }
        }
    }

    info!(
        merged = report.merged.len(),
        failed = report.failures.len(),
        warnings = report.totals.warnings.len(),
        "batch finished"
    );
    Ok(report)
}

async fn load_template(path: &Path) -> BatchResult<Document> {
    let owned = path.to_path_buf();
    let loaded = tokio::task::spawn_blocking(move || Document::from_file(&owned))
        .await
        .map_err(|e| BatchError::Worker {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    loaded.map_err(|source| BatchError::Template {
        path: path.to_path_buf(),
        source,
    })
}

/// Wait for one blocking merge, enforcing the per-file limit.
///
/// The job's permit is released when this returns, including on timeout, so
/// an abandoned merge no longer counts against `jobs`.
async fn supervise(
    source: PathBuf,
    work: JoinHandle<BatchResult<FileOutcome>>,
    limit: Option<Duration>,
    abandoned: Arc<AtomicBool>,
    _permit: OwnedSemaphorePermit,
) -> BatchResult<FileOutcome> {
    let joined = match limit {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(joined) => joined,
            Err(_) => {
                // The blocking thread cannot be interrupted; stop it from
                // writing output once it gets there.
                abandoned.store(true, Ordering::SeqCst);
                return Err(BatchError::Timeout {
                    path: source,
                    limit,
                });
            }
        },
        None => work.await,
    };

    joined
        .map_err(|e| BatchError::Worker {
            path: source,
            message: e.to_string(),
        })
        .and_then(|result| result)
}

/// One source file's merge, run on the blocking pool.
struct Job {
    merger: Arc<Merger>,
    template: Arc<Document>,
    source: PathBuf,
    output: PathBuf,
    write: WriteOptions,
    abandoned: Arc<AtomicBool>,
}

impl Job {
    fn run(self) -> BatchResult<FileOutcome> {
        let started = Instant::now();
        let document = Document::from_file(&self.source).map_err(|source| BatchError::Parse {
            path: self.source.clone(),
            source,
        })?;

        let merged = self.merger.merge(Document::clone(&self.template), &document);

        if self.abandoned.load(Ordering::SeqCst) {
            return Err(BatchError::Worker {
                path: self.source,
                message: "abandoned after timeout".into(),
            });
        }

        if let Some(parent) = self.output.parent() {
            std::fs::create_dir_all(parent).map_err(|source| BatchError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        merged
            .document
            .write_file(&self.output, &self.write)
            .map_err(|source| BatchError::Output {
                path: self.output.clone(),
                source,
            })?;

        for warning in &merged.report.warnings {
            warn!(source = %self.source.display(), "{warning}");
        }
        debug!(report = ?merged.report, "merge counters");
        info!(
            source = %self.source.display(),
            output = %self.output.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "merged"
        );

        Ok(FileOutcome {
            source: self.source,
            output: self.output,
            report: merged.report,
        })
    }
}
