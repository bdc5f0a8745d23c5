//! Provisioning followed by ingestion, as one call.

use appkg_core::AppRecord;

use super::{IngestOptions, IngestReport, Ingestor, LogProgress, ProgressReporter};
use crate::backend::GraphBackend;
use crate::error::IngestError;
use crate::schema::ProvisionReport;

/// Result of a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// `None` when provisioning was skipped.
    pub provision: Option<ProvisionReport>,
    pub ingest: IngestReport,
}

/// Schema provisioning and ingestion against one backend.
pub struct Pipeline<'a, B: GraphBackend + ?Sized> {
    backend: &'a B,
    options: IngestOptions,
    provision_schema: bool,
}

impl<'a, B: GraphBackend + ?Sized> Pipeline<'a, B> {
    pub fn new(backend: &'a B, options: IngestOptions) -> Self {
        Self {
            backend,
            options,
            provision_schema: true,
        }
    }

    /// Assume the schema is already in place.
    pub fn skip_schema(mut self, skip: bool) -> Self {
        self.provision_schema = !skip;
        self
    }

    pub async fn run(self, rows: &[AppRecord]) -> Result<PipelineReport, IngestError> {
        self.run_with_progress(rows, LogProgress::default()).await
    }

    pub async fn run_with_progress(
        self,
        rows: &[AppRecord],
        progress: impl ProgressReporter + 'a,
    ) -> Result<PipelineReport, IngestError> {
        let mut ingestor = Ingestor::new(self.backend, self.options).with_progress(progress);

        let provision = if self.provision_schema {
            Some(ingestor.provision().await?)
        } else {
            ingestor.assume_schema_ready()?;
            None
        };

        let ingest = ingestor.ingest(rows).await?;
        Ok(PipelineReport { provision, ingest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Dialect, WriteMode};
    use crate::error::{ProvisionError, StoreError};
    use crate::ingest::NoProgress;
    use crate::memory::tests::app;
    use crate::memory::MemoryBackend;

    #[tokio::test]
    async fn test_pipeline_provisions_then_ingests() {
        let backend = MemoryBackend::with_dialect(Dialect::TuGraph);
        let rows = vec![app("1", "Games"), app("2", "Games")];

        let report = Pipeline::new(&backend, IngestOptions::default())
            .run_with_progress(&rows, NoProgress)
            .await
            .unwrap();

        assert_eq!(report.provision.unwrap().created, backend.declared().len());
        assert_eq!(report.ingest.succeeded, 2);
        assert_eq!(backend.batch_sizes(), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_skip_schema_declares_nothing() {
        let backend = MemoryBackend::new(WriteMode::Bulk);
        let report = Pipeline::new(&backend, IngestOptions::default())
            .skip_schema(true)
            .run_with_progress(&[app("1", "Games")], NoProgress)
            .await
            .unwrap();

        assert!(report.provision.is_none());
        assert!(backend.declared().is_empty());
        assert!(report.ingest.is_completed());
    }

    #[tokio::test]
    async fn test_fatal_provisioning_stops_before_writes() {
        let backend = MemoryBackend::new(WriteMode::Bulk);
        backend.reject_declaration("app_id", StoreError::Unavailable("connection refused".into()));

        let err = Pipeline::new(&backend, IngestOptions::default())
            .run_with_progress(&[app("1", "Games")], NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Provision(ProvisionError::Store(_))));
        assert_eq!(backend.write_calls(), 0);
    }
}
