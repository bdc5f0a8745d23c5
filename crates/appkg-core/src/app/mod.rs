//! App entity and its dimension relationships.

pub mod model;

pub use model::{AppRecord, Dimension, APP_KEY, APP_LABEL};
