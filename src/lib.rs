//! studentguard: academic-risk classification core.
//!
//! This crate provides the data-cleaning pipeline, a from-scratch multinomial
//! logistic regression classifier, the evaluation harness (multiclass metrics,
//! confusion matrix, k-fold cross-validation), and the training orchestrator
//! that ties them together and persists model/scaler artifacts.
//!
//! The design favors small, testable modules: callers hand in plain in-memory
//! tables and hyperparameters and get back serializable result structs. No
//! HTTP or upload handling lives here.
pub mod cleaning;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod models;
pub mod preprocessing;
pub mod stats;
pub mod table;
pub mod trainer;

/// Initialize env_logger once for binaries or tests that want progress
/// output from the cleaning and training loops. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().format_timestamp(None).try_init();
}
