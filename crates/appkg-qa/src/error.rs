//! Question-answering errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QaError {
    /// The language model could not be reached or gave no usable statement.
    #[error("Query generation failed: {0}")]
    Generation(String),

    /// The generated statement failed against the graph store.
    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Question is empty")]
    EmptyQuestion,
}

impl From<reqwest::Error> for QaError {
    fn from(e: reqwest::Error) -> Self {
        Self::Generation(e.to_string())
    }
}

impl From<appkg_graph::StoreError> for QaError {
    fn from(e: appkg_graph::StoreError) -> Self {
        Self::Execution(e.to_string())
    }
}
