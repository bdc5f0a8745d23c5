//! Progress signals emitted during ingestion.

use tracing::info;

use super::IngestReport;

/// Receives processed-count signals from the ingestor.
///
/// `advance` is called after every chunk in bulk mode and after every
/// `progress_every` successful rows in per-row mode.
pub trait ProgressReporter: Send {
    fn start(&mut self, _total: usize) {}

    fn advance(&mut self, processed: usize, succeeded: usize);

    fn finish(&mut self, _report: &IngestReport) {}
}

/// Reports progress through `tracing`.
#[derive(Debug, Default)]
pub struct LogProgress {
    total: usize,
}

impl ProgressReporter for LogProgress {
    fn start(&mut self, total: usize) {
        self.total = total;
        info!(total, "Ingestion started");
    }

    fn advance(&mut self, processed: usize, succeeded: usize) {
        info!(processed, succeeded, total = self.total, "Ingestion progress");
    }
}

/// Discards all signals.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn advance(&mut self, _processed: usize, _succeeded: usize) {}
}
