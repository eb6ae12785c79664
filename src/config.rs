//! Hyperparameter configuration for the classifier and trainer.

use serde::{Deserialize, Serialize};

/// Seed used by default for weight initialization and the train/test
/// permutation. Kept at 42 so existing fixtures stay reproducible; callers
/// may inject any other seed.
pub const DEFAULT_SEED: u64 = 42;

/// Central configuration for training the logistic regression classifier.
///
/// Training always runs exactly `max_iterations` gradient descent steps;
/// there is no convergence check or early stopping.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TrainingConfig {
    /// Step size for the gradient descent updates.
    pub learning_rate: f64,
    /// Fixed number of batch gradient descent iterations.
    pub max_iterations: usize,
    /// L2 penalty strength applied to the weight matrix.
    pub regularization: f64,
    /// Seed for the weight-initialization RNG.
    pub seed: u64,
}

impl TrainingConfig {
    pub fn new(learning_rate: f64, max_iterations: usize, regularization: f64) -> Self {
        Self {
            learning_rate,
            max_iterations,
            regularization,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            max_iterations: 1000,
            regularization: 0.01,
            seed: DEFAULT_SEED,
        }
    }
}
