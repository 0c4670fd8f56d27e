//! Bounded worker pool that turns a [`TargetList`] into a finished [`ScanRun`].
//!
//! A fixed set of `concurrency` tokio tasks pull targets from one FIFO queue,
//! capture them through the [`CaptureAdapter`], write the image and send the
//! outcome to the coordinating task. Only the coordinator touches the ledger.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use shotlist_core::{
    CaptureOutcome, CaptureStatus, CaptureTarget, ConfigError, InvalidInputError, LedgerError,
    ProgressTracker, ScanConfig, ScanRun, TargetList,
};
use shotlist_logging::{scan_debug, scan_error, scan_info, scan_warn};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::backend::{CaptureAdapter, CaptureBackend};
use crate::events::{ProgressSink, ScanEvent};
use crate::filename::capture_filename;
use crate::manifest::{write_run_manifest, UrlMapping};
use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError};

/// Extra attempts after the first for retryable failures.
pub const RETRY_BUDGET: usize = 1;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Input(#[from] InvalidInputError),
    #[error("invalid scan configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    OutputDir(#[from] PersistError),
    /// One target got two outcomes; the scheduler itself is broken.
    #[error("ledger invariant violated: {0}")]
    Ledger(#[from] LedgerError),
    #[error("scan engine failure: {0}")]
    Engine(String),
}

/// FIFO hand-off of targets in `sequence_index` order.
#[derive(Debug, Default)]
struct WorkQueue {
    items: Mutex<VecDeque<CaptureTarget>>,
}

impl WorkQueue {
    fn new(targets: Vec<CaptureTarget>) -> Self {
        Self {
            items: Mutex::new(targets.into()),
        }
    }

    fn pop(&self) -> Option<CaptureTarget> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    fn drain(&self) -> Vec<CaptureTarget> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect()
    }
}

struct WorkerContext {
    adapter: CaptureAdapter,
    queue: WorkQueue,
    writer: AtomicFileWriter,
    quality: u8,
    timeout: std::time::Duration,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl WorkerContext {
    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

pub struct Scheduler {
    adapter: CaptureAdapter,
}

impl Scheduler {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self {
            adapter: CaptureAdapter::new(backend),
        }
    }

    /// Run every target to a terminal outcome, or stop early on `cancel`.
    ///
    /// Setup problems fail before any worker starts. Per-target failures
    /// never abort the run. Manifest and URL mapping are written on every
    /// termination; failures there are logged only.
    pub async fn run(
        &self,
        list: TargetList,
        config: &ScanConfig,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<ScanRun, ScanError> {
        config.validate()?;
        if list.targets.is_empty() {
            return Err(InvalidInputError {
                rejected: list.rejected.len(),
            }
            .into());
        }
        ensure_output_dir(&config.output_dir)?;

        let mut run = ScanRun::start(config, list.total());
        let progress = ProgressTracker::new(run.total_targets);
        scan_info!(
            "Scan {} started: {} target(s), concurrency={}, quality={}, timeout={}ms",
            run.run_id,
            run.total_targets,
            config.concurrency,
            config.quality,
            config.timeout_ms()
        );
        sink.emit(ScanEvent::Started {
            run_id: run.run_id,
            total: run.total_targets,
        });

        for rejected in list.rejected {
            let outcome = CaptureOutcome::unsuccessful(
                rejected.target,
                CaptureStatus::Skipped,
                rejected.reason,
                0,
            );
            deliver(&mut run, &progress, sink.as_ref(), outcome)?;
        }

        let context = Arc::new(WorkerContext {
            adapter: self.adapter.clone(),
            queue: WorkQueue::new(list.targets),
            writer: AtomicFileWriter::new(config.output_dir.clone()),
            quality: config.quality,
            timeout: config.timeout,
            deadline: config.run_deadline.map(|budget| Instant::now() + budget),
            cancel: cancel.child_token(),
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut workers = JoinSet::new();
        for worker_id in 0..config.concurrency {
            let context = Arc::clone(&context);
            let tx = tx.clone();
            workers.spawn(worker_loop(worker_id, context, tx));
        }
        drop(tx);

        while let Some(outcome) = rx.recv().await {
            if let Err(err) = deliver(&mut run, &progress, sink.as_ref(), outcome) {
                scan_error!("Aborting scan {}: {}", run.run_id, err);
                context.cancel.cancel();
                workers.abort_all();
                return Err(err);
            }
        }

        let mut worker_failed = false;
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                scan_error!("Capture worker ended abnormally: {}", err);
                worker_failed = true;
            }
        }

        // Cancellation that lands after the last dispatch changes nothing.
        let undispatched = context.queue.drain();
        let cancelled = cancel.is_cancelled() && !undispatched.is_empty();
        for target in undispatched {
            let outcome = if cancelled {
                CaptureOutcome::unsuccessful(target, CaptureStatus::Skipped, "cancelled", 0)
            } else if context.deadline_passed() {
                CaptureOutcome::unsuccessful(
                    target,
                    CaptureStatus::TimedOut,
                    "timeout: scan deadline elapsed before dispatch",
                    0,
                )
            } else {
                CaptureOutcome::unsuccessful(
                    target,
                    CaptureStatus::Failed,
                    "capture worker stopped before dispatch",
                    0,
                )
            };
            deliver(&mut run, &progress, sink.as_ref(), outcome)?;
        }
        if worker_failed && !run.ledger().is_complete() {
            return Err(ScanError::Engine(
                "a capture worker stopped with a target in flight".to_string(),
            ));
        }

        run.finish(cancelled);
        if cancelled {
            scan_info!("Scan {} cancelled", run.run_id);
        }
        flush_run_files(&run).await;

        let counts = run.counts();
        scan_info!(
            "Scan {} finished: {} succeeded, {} failed, {} skipped",
            run.run_id,
            counts.succeeded,
            counts.failed,
            counts.skipped
        );
        sink.emit(ScanEvent::Finished {
            run_id: run.run_id,
            counts,
            cancelled,
        });
        Ok(run)
    }

    pub async fn shutdown(&self) {
        self.adapter.shutdown().await;
    }
}

fn deliver(
    run: &mut ScanRun,
    progress: &ProgressTracker,
    sink: &dyn ProgressSink,
    outcome: CaptureOutcome,
) -> Result<(), ScanError> {
    run.record(outcome.clone())?;
    let snapshot = progress.on_outcome(&outcome);
    sink.emit(ScanEvent::Outcome(outcome));
    sink.emit(ScanEvent::Progress(snapshot));
    Ok(())
}

async fn worker_loop(
    worker_id: usize,
    context: Arc<WorkerContext>,
    tx: mpsc::UnboundedSender<CaptureOutcome>,
) {
    loop {
        if context.cancel.is_cancelled() || context.deadline_passed() {
            break;
        }
        let Some(target) = context.queue.pop() else {
            break;
        };
        scan_debug!(
            "Worker {} capturing #{} {}",
            worker_id,
            target.sequence_index,
            target.normalized_url
        );
        let outcome = capture_target(&context, target).await;
        if tx.send(outcome).is_err() {
            break;
        }
    }
    scan_debug!("Worker {} exiting", worker_id);
}

async fn capture_target(context: &WorkerContext, target: CaptureTarget) -> CaptureOutcome {
    let started = Instant::now();
    let mut attempt = 0;
    let bytes = loop {
        match context
            .adapter
            .capture(&target, context.quality, context.timeout)
            .await
        {
            Ok(bytes) => break bytes,
            Err(err)
                if err.kind.is_retryable()
                    && attempt < RETRY_BUDGET
                    && !context.cancel.is_cancelled() =>
            {
                attempt += 1;
                scan_warn!(
                    "Retrying #{} {} after {}",
                    target.sequence_index,
                    target.normalized_url,
                    err
                );
            }
            Err(err) => {
                scan_warn!(
                    "Capture failed for #{} {}: {}",
                    target.sequence_index,
                    target.normalized_url,
                    err
                );
                return CaptureOutcome::unsuccessful(
                    target,
                    CaptureStatus::Failed,
                    err.to_string(),
                    elapsed_ms(started),
                );
            }
        }
    };

    let filename = capture_filename(target.host().as_deref(), target.sequence_index);
    match store_image(context.writer.clone(), filename, bytes).await {
        Ok(path) => {
            scan_info!(
                "Captured #{} {} -> {}",
                target.sequence_index,
                target.normalized_url,
                path.display()
            );
            CaptureOutcome::success(target, path, elapsed_ms(started))
        }
        Err(detail) => {
            scan_warn!(
                "Could not store image for #{}: {}",
                target.sequence_index,
                detail
            );
            CaptureOutcome::unsuccessful(
                target,
                CaptureStatus::Failed,
                detail,
                elapsed_ms(started),
            )
        }
    }
}

/// Write the image off the async threads and confirm it is on disk and non-empty.
async fn store_image(
    writer: AtomicFileWriter,
    filename: String,
    bytes: Vec<u8>,
) -> Result<PathBuf, String> {
    let written = tokio::task::spawn_blocking(move || {
        let path = writer.write(&filename, &bytes)?;
        let len = std::fs::metadata(&path)?.len();
        Ok::<_, PersistError>((path, len))
    })
    .await
    .map_err(|err| format!("write error: {err}"))?;

    match written {
        Ok((path, len)) if len > 0 => Ok(path),
        Ok((path, _)) => Err(format!("write error: {} is empty", path.display())),
        Err(err) => Err(format!("write error: {err}")),
    }
}

async fn flush_run_files(run: &ScanRun) {
    let snapshot = run.clone();
    let flushed = tokio::task::spawn_blocking(move || {
        if let Err(err) = write_run_manifest(&snapshot) {
            scan_error!("Failed to write manifest for scan {}: {}", snapshot.run_id, err);
        }
        let mut mapping = UrlMapping::load(&snapshot.output_dir);
        mapping.merge_run(&snapshot);
        if let Err(err) = mapping.save(&snapshot.output_dir) {
            scan_error!("Failed to write url mapping: {}", err);
        }
    })
    .await;
    if let Err(err) = flushed {
        scan_error!("Run file flush task failed: {}", err);
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
