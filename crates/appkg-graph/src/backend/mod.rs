//! Backend-capability interface.
//!
//! The ingestor and provisioner are written once against [`GraphBackend`];
//! backends differ in whether they accept a whole batch per call and in how
//! schema objects are declared.

pub mod cypher;

use async_trait::async_trait;
use serde::Deserialize;

use appkg_core::AppRecord;

use crate::client::GraphCounts;
use crate::error::StoreError;
use crate::schema::SchemaDeclaration;

pub use cypher::{CypherBackend, Dialect};

/// How the backend accepts writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// One call carries a whole batch, applied atomically.
    Bulk,
    /// One call per row, each committed independently.
    PerRow,
}

/// Backend selection, as given on the command line or in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Neo4j,
    TuGraph,
    Memory,
    /// In-memory store with TuGraph's per-row writes and label schema.
    #[serde(rename = "memory-tugraph")]
    MemoryTuGraph,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Neo4j => "neo4j",
            BackendKind::TuGraph => "tugraph",
            BackendKind::Memory => "memory",
            BackendKind::MemoryTuGraph => "memory-tugraph",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "neo4j" => Some(Self::Neo4j),
            "tugraph" => Some(Self::TuGraph),
            "memory" | "dry-run" => Some(Self::Memory),
            "memory-tugraph" => Some(Self::MemoryTuGraph),
            _ => None,
        }
    }

    /// Dialect used for schema and write mode.
    pub fn dialect(&self) -> Dialect {
        match self {
            BackendKind::TuGraph | BackendKind::MemoryTuGraph => Dialect::TuGraph,
            BackendKind::Neo4j | BackendKind::Memory => Dialect::Neo4j,
        }
    }

    /// Whether nothing is persisted.
    pub fn is_memory(&self) -> bool {
        matches!(self, BackendKind::Memory | BackendKind::MemoryTuGraph)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown backend '{}' (expected neo4j, tugraph, memory or memory-tugraph)", s))
    }
}

/// A graph store the pipeline can write to.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn write_mode(&self) -> WriteMode;

    /// Schema objects to ensure before ingestion, in any order.
    fn schema_declarations(&self) -> Vec<SchemaDeclaration>;

    /// Create one schema object.
    async fn declare(&self, declaration: &SchemaDeclaration) -> Result<(), StoreError>;

    /// Upsert a whole batch in one call.
    async fn upsert_batch(&self, rows: &[AppRecord]) -> Result<(), StoreError>;

    /// Upsert one row.
    async fn upsert_row(&self, row: &AppRecord) -> Result<(), StoreError>;

    /// Node and relationship totals.
    async fn counts(&self) -> Result<GraphCounts, StoreError>;
}
