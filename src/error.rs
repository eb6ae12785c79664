//! Error types for the studentguard core.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for cleaning, training, evaluation, and persistence.
///
/// Every error is raised at the point of detection and surfaced unchanged to
/// the caller; there are no internal retries. A failed cleaning or training
/// step never leaves partially written artifacts behind.
#[derive(Error, Debug)]
pub enum Error {
    /// One or more of the 10 required input columns is absent.
    #[error("missing required columns: {}", .0.join(", "))]
    Schema(Vec<String>),

    /// Malformed single-record input or invalid training data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Inference or persistence was requested before `fit` or `load`.
    #[error("model not fitted; train the model or load a saved one first")]
    NotFitted,

    /// `train` was called before `prepare_data`.
    #[error("training data not prepared; call prepare_data first")]
    NotPrepared,

    /// The label column holds fewer than 2 distinct classes.
    #[error("at least 2 distinct label classes are required for training")]
    InsufficientClasses,

    /// A model or scaler artifact could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Matrix dimensions do not line up.
    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
