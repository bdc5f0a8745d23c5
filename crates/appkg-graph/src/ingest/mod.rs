//! Batch ingestion.
//!
//! One ingestor serves both write modes. A bulk backend receives contiguous
//! chunks of `batch_size` rows in a single call each, and the run stops at the
//! first rejected chunk. A per-row backend receives one call per row; failed
//! rows are skipped unless the warm-up window fails entirely.
//!
//! Per run: `NotStarted -> SchemaReady -> Ingesting -> Completed | AbortedOnError`.

mod pipeline;
mod progress;

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use appkg_core::AppRecord;

use crate::backend::{GraphBackend, WriteMode};
use crate::error::{IngestError, StoreError};
use crate::schema::{ProvisionReport, SchemaProvisioner};

pub use pipeline::{Pipeline, PipelineReport};
pub use progress::{LogProgress, NoProgress, ProgressReporter};

/// Tunables for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Rows per chunk in bulk mode. Per-row mode always writes one row per call.
    pub batch_size: usize,
    /// Per-row mode: abort if this many writes fail before the first success.
    /// Zero disables the check.
    pub warmup_failures: usize,
    /// Per-row mode: successes between progress signals.
    pub progress_every: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            warmup_failures: 6,
            progress_every: 500,
        }
    }
}

/// Lifecycle of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    SchemaReady,
    Ingesting,
    Completed,
    AbortedOnError,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunState::NotStarted => "not started",
            RunState::SchemaReady => "schema ready",
            RunState::Ingesting => "ingesting",
            RunState::Completed => "completed",
            RunState::AbortedOnError => "aborted",
        };
        f.write_str(s)
    }
}

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// Bulk mode: a chunk was rejected (1-based chunk number).
    BatchRejected { batch: usize, error: StoreError },
    /// Per-row mode: every write in the warm-up window failed, which points
    /// at a configuration problem rather than bad rows.
    WarmupExhausted { attempts: usize, last_error: StoreError },
    /// Per-row mode: the store went away or refused the credentials.
    StoreLost(StoreError),
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::BatchRejected { batch, error } => write!(f, "batch {} rejected: {}", batch, error),
            AbortReason::WarmupExhausted { attempts, last_error } => write!(
                f,
                "first {} writes all failed, check connection settings and schema (last error: {})",
                attempts, last_error
            ),
            AbortReason::StoreLost(e) => write!(f, "store lost: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Completed,
    Aborted(AbortReason),
}

/// Counters for a finished run. Returned for aborted runs too.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Rows submitted to the store, failed ones included.
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub batches_submitted: usize,
    pub batches_succeeded: usize,
    pub elapsed: Duration,
    pub outcome: IngestOutcome,
}

impl IngestReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == IngestOutcome::Completed
    }

    /// Rows written per second.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.succeeded as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Default)]
struct Tally {
    processed: usize,
    succeeded: usize,
    failed: usize,
    batches_submitted: usize,
    batches_succeeded: usize,
}

impl Tally {
    fn into_report(self, started: Instant, outcome: IngestOutcome) -> IngestReport {
        IngestReport {
            processed: self.processed,
            succeeded: self.succeeded,
            failed: self.failed,
            batches_submitted: self.batches_submitted,
            batches_succeeded: self.batches_succeeded,
            elapsed: started.elapsed(),
            outcome,
        }
    }
}

/// Writes normalized rows to a backend.
pub struct Ingestor<'a, B: GraphBackend + ?Sized> {
    backend: &'a B,
    options: IngestOptions,
    progress: Box<dyn ProgressReporter + 'a>,
    state: RunState,
}

impl<'a, B: GraphBackend + ?Sized> Ingestor<'a, B> {
    pub fn new(backend: &'a B, options: IngestOptions) -> Self {
        Self {
            backend,
            options,
            progress: Box::new(LogProgress::default()),
            state: RunState::NotStarted,
        }
    }

    pub fn with_progress(mut self, progress: impl ProgressReporter + 'a) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    fn expect_state(&self, expected: RunState) -> Result<(), IngestError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(IngestError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    /// Provision the backend's schema. A provisioning error ends the run.
    pub async fn provision(&mut self) -> Result<ProvisionReport, IngestError> {
        self.expect_state(RunState::NotStarted)?;

        match SchemaProvisioner::new(self.backend).provision().await {
            Ok(report) => {
                self.state = RunState::SchemaReady;
                Ok(report)
            }
            Err(e) => {
                self.state = RunState::AbortedOnError;
                Err(e.into())
            }
        }
    }

    /// Skip provisioning for a store whose schema is managed elsewhere.
    pub fn assume_schema_ready(&mut self) -> Result<(), IngestError> {
        self.expect_state(RunState::NotStarted)?;
        self.state = RunState::SchemaReady;
        Ok(())
    }

    /// Write every row. Store failures are reported in the returned report,
    /// never as an error.
    pub async fn ingest(&mut self, rows: &[AppRecord]) -> Result<IngestReport, IngestError> {
        self.expect_state(RunState::SchemaReady)?;
        self.state = RunState::Ingesting;

        let mode = self.backend.write_mode();
        let batch_size = match mode {
            WriteMode::Bulk => self.options.batch_size.max(1),
            WriteMode::PerRow => 1,
        };
        info!(
            backend = self.backend.name(),
            rows = rows.len(),
            batch_size,
            ?mode,
            "Starting ingestion"
        );
        self.progress.start(rows.len());

        let started = Instant::now();
        let (tally, outcome) = match mode {
            WriteMode::Bulk => self.ingest_bulk(rows, batch_size).await,
            WriteMode::PerRow => self.ingest_per_row(rows).await,
        };
        let report = self.settle(tally.into_report(started, outcome));

        self.progress.finish(&report);
        Ok(report)
    }

    fn settle(&mut self, report: IngestReport) -> IngestReport {
        match &report.outcome {
            IngestOutcome::Completed => {
                self.state = RunState::Completed;
                info!(
                    processed = report.processed,
                    succeeded = report.succeeded,
                    failed = report.failed,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Ingestion completed"
                );
            }
            IngestOutcome::Aborted(reason) => {
                self.state = RunState::AbortedOnError;
                error!(
                    processed = report.processed,
                    succeeded = report.succeeded,
                    reason = %reason,
                    "Ingestion aborted"
                );
            }
        }
        report
    }

    async fn ingest_bulk(&mut self, rows: &[AppRecord], batch_size: usize) -> (Tally, IngestOutcome) {
        let mut tally = Tally::default();

        for (index, chunk) in rows.chunks(batch_size).enumerate() {
            let batch = index + 1;
            tally.batches_submitted += 1;
            tally.processed += chunk.len();

            match tolerate_existing(self.backend.upsert_batch(chunk).await) {
                Ok(()) => {
                    tally.batches_succeeded += 1;
                    tally.succeeded += chunk.len();
                    debug!(batch, rows = chunk.len(), "Batch written");
                    self.progress.advance(tally.processed, tally.succeeded);
                }
                Err(error) => {
                    tally.failed += chunk.len();
                    error!(batch, rows = chunk.len(), error = %error, "Batch rejected, stopping");
                    return (tally, IngestOutcome::Aborted(AbortReason::BatchRejected { batch, error }));
                }
            }
        }

        (tally, IngestOutcome::Completed)
    }

    /// Every row is its own batch of one.
    async fn ingest_per_row(&mut self, rows: &[AppRecord]) -> (Tally, IngestOutcome) {
        let mut tally = Tally::default();
        let progress_every = self.options.progress_every.max(1);

        for row in rows {
            tally.batches_submitted += 1;
            tally.processed += 1;

            let error = match tolerate_existing(self.backend.upsert_row(row).await) {
                Ok(()) => {
                    tally.batches_succeeded += 1;
                    tally.succeeded += 1;
                    if tally.succeeded % progress_every == 0 {
                        self.progress.advance(tally.processed, tally.succeeded);
                    }
                    continue;
                }
                Err(error) => error,
            };
            tally.failed += 1;

            if error.is_fatal() {
                error!(app_id = %row.app_id, error = %error, "Graph store lost, stopping");
                return (tally, IngestOutcome::Aborted(AbortReason::StoreLost(error)));
            }

            warn!(app_id = %row.app_id, error = %error, "Row rejected, skipping");

            let threshold = self.options.warmup_failures;
            if threshold > 0 && tally.succeeded == 0 && tally.failed >= threshold {
                error!(attempts = tally.failed, "No write succeeded during warm-up, stopping");
                return (
                    tally,
                    IngestOutcome::Aborted(AbortReason::WarmupExhausted {
                        attempts: threshold,
                        last_error: error,
                    }),
                );
            }
        }

        (tally, IngestOutcome::Completed)
    }
}

/// An upsert that hit an existing entity has still merged it.
fn tolerate_existing(result: Result<(), StoreError>) -> Result<(), StoreError> {
    match result {
        Err(StoreError::AlreadyExists(message)) => {
            debug!(%message, "Entity already exists, treating write as merged");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::memory::tests::app;
    use crate::memory::MemoryBackend;

    fn rows(n: usize) -> Vec<AppRecord> {
        (0..n).map(|i| app(&i.to_string(), if i % 2 == 0 { "Games" } else { "Books" })).collect()
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(usize, usize)>>>);

    impl ProgressReporter for Recorder {
        fn advance(&mut self, processed: usize, succeeded: usize) {
            self.0.lock().unwrap().push((processed, succeeded));
        }
    }

    async fn ready<'a>(backend: &'a MemoryBackend, options: IngestOptions) -> Ingestor<'a, MemoryBackend> {
        let mut ingestor = Ingestor::new(backend, options).with_progress(NoProgress);
        ingestor.provision().await.unwrap();
        ingestor
    }

    #[tokio::test]
    async fn test_batch_boundaries() {
        let backend = MemoryBackend::new(WriteMode::Bulk);
        let mut ingestor = ready(&backend, IngestOptions::default()).await;

        let report = ingestor.ingest(&rows(2500)).await.unwrap();

        assert_eq!(backend.batch_sizes(), vec![1000, 1000, 500]);
        assert_eq!(report.batches_submitted, 3);
        assert_eq!(report.batches_succeeded, 3);
        assert_eq!(report.succeeded, 2500);
        assert_eq!(report.outcome, IngestOutcome::Completed);
        assert_eq!(ingestor.state(), RunState::Completed);
    }

    #[tokio::test]
    async fn test_bulk_fails_fast() {
        let backend = MemoryBackend::new(WriteMode::Bulk);
        backend.fail_writes([2], StoreError::Rejected("type mismatch".into()));
        let mut ingestor = ready(&backend, IngestOptions::default()).await;

        let report = ingestor.ingest(&rows(2500)).await.unwrap();

        assert_eq!(backend.write_calls(), 2);
        assert_eq!(report.succeeded, 1000);
        assert_eq!(report.processed, 2000);
        assert_eq!(report.batches_succeeded, 1);
        assert!(matches!(
            report.outcome,
            IngestOutcome::Aborted(AbortReason::BatchRejected { batch: 2, .. })
        ));
        assert_eq!(ingestor.state(), RunState::AbortedOnError);
        assert_eq!(backend.app_count(), 1000);
    }

    #[tokio::test]
    async fn test_per_row_warmup_abort() {
        let backend = MemoryBackend::new(WriteMode::PerRow);
        backend.fail_all_writes(StoreError::MissingLabel("App".into()));
        let mut ingestor = ready(&backend, IngestOptions::default()).await;

        let report = ingestor.ingest(&rows(20)).await.unwrap();

        assert_eq!(backend.write_calls(), 6);
        assert_eq!(report.failed, 6);
        assert_eq!(report.succeeded, 0);
        assert!(matches!(
            report.outcome,
            IngestOutcome::Aborted(AbortReason::WarmupExhausted { attempts: 6, .. })
        ));
    }

    #[tokio::test]
    async fn test_per_row_skips_after_warmup() {
        let backend = MemoryBackend::new(WriteMode::PerRow);
        backend.fail_writes([2, 3, 9], StoreError::Rejected("bad value".into()));
        let mut ingestor = ready(&backend, IngestOptions::default()).await;

        let report = ingestor.ingest(&rows(10)).await.unwrap();

        assert!(report.is_completed());
        assert_eq!(report.processed, 10);
        assert_eq!(report.succeeded, 7);
        assert_eq!(report.failed, 3);
        assert_eq!(report.batches_submitted, 10);
        assert_eq!(report.batches_succeeded, 7);
        assert_eq!(backend.batch_sizes(), vec![1; 7]);
        assert_eq!(backend.app_count(), 7);
    }

    fn existing_app() -> StoreError {
        StoreError::classify(
            "Neo.ClientError.Schema.ConstraintValidationFailed: Node(12) already exists with label `App` and property `app_id` = '12'",
        )
    }

    #[tokio::test]
    async fn test_bulk_existing_entity_is_not_a_failure() {
        let backend = MemoryBackend::new(WriteMode::Bulk);
        backend.fail_writes([2], existing_app());
        let mut ingestor = ready(&backend, IngestOptions::default()).await;

        let report = ingestor.ingest(&rows(2500)).await.unwrap();

        assert_eq!(backend.write_calls(), 3);
        assert_eq!(report.outcome, IngestOutcome::Completed);
        assert_eq!(report.succeeded, 2500);
        assert_eq!(report.failed, 0);
        assert_eq!(report.batches_succeeded, 3);
        assert_eq!(ingestor.state(), RunState::Completed);
    }

    #[tokio::test]
    async fn test_per_row_existing_entity_is_not_a_failure() {
        let backend = MemoryBackend::new(WriteMode::PerRow);
        backend.fail_writes([1, 2, 3, 4, 5, 6, 7], existing_app());
        let mut ingestor = ready(&backend, IngestOptions::default()).await;

        let report = ingestor.ingest(&rows(8)).await.unwrap();

        assert!(report.is_completed());
        assert_eq!(report.succeeded, 8);
        assert_eq!(report.failed, 0);
        assert_eq!(backend.write_calls(), 8);
    }

    #[tokio::test]
    async fn test_warmup_threshold_is_configurable() {
        let backend = MemoryBackend::new(WriteMode::PerRow);
        backend.fail_writes(1..=3, StoreError::Rejected("bad value".into()));
        let options = IngestOptions {
            warmup_failures: 3,
            ..IngestOptions::default()
        };
        let mut ingestor = ready(&backend, options).await;

        let report = ingestor.ingest(&rows(10)).await.unwrap();
        assert_eq!(report.processed, 3);
        assert!(!report.is_completed());
    }

    #[tokio::test]
    async fn test_per_row_store_loss_is_fatal() {
        let backend = MemoryBackend::new(WriteMode::PerRow);
        backend.fail_writes([4], StoreError::Unavailable("connection reset".into()));
        let mut ingestor = ready(&backend, IngestOptions::default()).await;

        let report = ingestor.ingest(&rows(10)).await.unwrap();
        assert_eq!(report.processed, 4);
        assert!(matches!(report.outcome, IngestOutcome::Aborted(AbortReason::StoreLost(_))));
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let backend = MemoryBackend::new(WriteMode::Bulk);
        let input = rows(30);

        ready(&backend, IngestOptions::default()).await.ingest(&input).await.unwrap();
        let nodes = backend.node_count();
        let edges = backend.edge_count();

        ready(&backend, IngestOptions::default()).await.ingest(&input).await.unwrap();
        assert_eq!(backend.node_count(), nodes);
        assert_eq!(backend.edge_count(), edges);
        assert_eq!(backend.app_count(), 30);
    }

    #[tokio::test]
    async fn test_progress_signals() {
        let bulk = MemoryBackend::new(WriteMode::Bulk);
        let recorder = Recorder::default();
        let options = IngestOptions {
            batch_size: 10,
            ..IngestOptions::default()
        };
        let mut ingestor = Ingestor::new(&bulk, options).with_progress(recorder.clone());
        ingestor.provision().await.unwrap();
        ingestor.ingest(&rows(25)).await.unwrap();
        assert_eq!(*recorder.0.lock().unwrap(), vec![(10, 10), (20, 20), (25, 25)]);

        let per_row = MemoryBackend::new(WriteMode::PerRow);
        let recorder = Recorder::default();
        let options = IngestOptions {
            progress_every: 4,
            ..IngestOptions::default()
        };
        let mut ingestor = Ingestor::new(&per_row, options).with_progress(recorder.clone());
        ingestor.provision().await.unwrap();
        ingestor.ingest(&rows(9)).await.unwrap();
        assert_eq!(*recorder.0.lock().unwrap(), vec![(4, 4), (8, 8)]);
    }

    #[tokio::test]
    async fn test_state_transitions_are_enforced() {
        let backend = MemoryBackend::new(WriteMode::Bulk);
        let mut ingestor = Ingestor::new(&backend, IngestOptions::default()).with_progress(NoProgress);
        assert_eq!(ingestor.state(), RunState::NotStarted);

        assert!(matches!(
            ingestor.ingest(&rows(1)).await,
            Err(IngestError::InvalidState { actual: RunState::NotStarted, .. })
        ));

        ingestor.assume_schema_ready().unwrap();
        assert_eq!(ingestor.state(), RunState::SchemaReady);
        ingestor.ingest(&rows(1)).await.unwrap();
        assert!(ingestor.ingest(&rows(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_provision_failure_aborts_run() {
        let backend = MemoryBackend::new(WriteMode::Bulk);
        backend.reject_declaration("app_id", StoreError::Auth("bad password".into()));
        let mut ingestor = Ingestor::new(&backend, IngestOptions::default()).with_progress(NoProgress);

        assert!(ingestor.provision().await.is_err());
        assert_eq!(ingestor.state(), RunState::AbortedOnError);
        assert_eq!(backend.write_calls(), 0);
    }
}
