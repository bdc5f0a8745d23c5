//! Typed results of graph store calls.

use thiserror::Error;

use crate::ingest::RunState;

/// Failure of a single store call, classified from the driver's message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Graph store unavailable: {0}")]
    Unavailable(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Schema object already exists: {0}")]
    AlreadyExists(String),

    #[error("Referenced label does not exist: {0}")]
    MissingLabel(String),

    #[error("Write rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    /// Classify a driver or server error message.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("already exists") || lower.contains("equivalentschemarulealreadyexists") {
            Self::AlreadyExists(message)
        } else if lower.contains("unauthorized")
            || lower.contains("authentication")
            || lower.contains("credentials")
        {
            Self::Auth(message)
        } else if lower.contains("connection refused")
            || lower.contains("connection reset")
            || lower.contains("broken pipe")
            || lower.contains("unavailable")
            || lower.contains("timed out")
            || lower.contains("connection error")
        {
            Self::Unavailable(message)
        } else if lower.contains("label")
            && (lower.contains("not exist") || lower.contains("not found") || lower.contains("unknown"))
        {
            Self::MissingLabel(message)
        } else {
            Self::Rejected(message)
        }
    }

    /// Errors that mean no further call can succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Auth(_))
    }
}

impl From<neo4rs::Error> for StoreError {
    fn from(e: neo4rs::Error) -> Self {
        Self::classify(e.to_string())
    }
}

/// Schema state that makes ingestion impossible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("Edge label {edge} references vertex label {label}, which is not declared")]
    MissingVertexLabel { edge: String, label: String },

    #[error("Graph store failed during provisioning: {0}")]
    Store(StoreError),
}

/// Misuse of an ingestion run, or a schema that cannot be provisioned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("Ingestion run is {actual}, expected {expected}")]
    InvalidState { expected: RunState, actual: RunState },

    #[error(transparent)]
    Provision(#[from] ProvisionError),
}
