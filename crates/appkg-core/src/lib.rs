//! AppKG Core Library
//!
//! App metadata model, column alias resolution and row normalization,
//! CSV table reading, and the cleaning/bucketing helpers used before ingestion.

pub mod app;
pub mod clean;
pub mod error;
pub mod normalize;
pub mod table;

pub use app::model::{AppRecord, Dimension};
pub use error::{AppkgError, AppkgResult, SkipRow};
pub use normalize::{NormalizedTable, Normalizer};
pub use table::Table;
