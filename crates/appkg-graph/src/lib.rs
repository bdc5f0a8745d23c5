//! # AppKG Graph
//!
//! Graph store integration for AppKG.
//!
//! Provides the connection client, the backend-capability interface with its
//! Cypher and in-memory implementations, schema provisioning, and the batch
//! ingestor that turns normalized App rows into idempotent MERGE writes.

pub mod backend;
pub mod client;
pub mod error;
pub mod ingest;
pub mod memory;
pub mod schema;
pub mod statements;

pub use backend::{BackendKind, CypherBackend, Dialect, GraphBackend, WriteMode};
pub use client::{GraphClient, GraphConfig, GraphCounts};
pub use error::{IngestError, ProvisionError, StoreError};
pub use ingest::{
    AbortReason, IngestOptions, IngestOutcome, IngestReport, Ingestor, LogProgress, NoProgress, Pipeline,
    PipelineReport, ProgressReporter, RunState,
};
pub use memory::MemoryBackend;
pub use schema::{ProvisionReport, SchemaDeclaration, SchemaProvisioner};
