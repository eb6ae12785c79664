//! Multinomial logistic regression trained by batch gradient descent.
//!
//! Implemented from scratch on top of `ndarray`: seeded normal weight
//! initialization, numerically stabilized softmax, cross-entropy cost with an
//! L2 penalty, and a fixed iteration budget with no early stopping. The full
//! parameter set round-trips through an opaque bincode blob.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use crate::config::TrainingConfig;
use crate::error::{Error, Result};

/// Std of the seeded normal distribution used for weight initialization.
const WEIGHT_INIT_STD: f64 = 0.01;

/// Clipping epsilon keeping probabilities away from {0, 1} before logs.
const COST_EPSILON: f64 = 1e-15;

/// Complete parameter set of a fitted model. Immutable once `fit` completes,
/// except by loading a saved blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Weight matrix, features x classes.
    pub weights: Array2<f64>,
    /// Bias row vector, 1 x classes.
    pub bias: Array2<f64>,
    /// Class labels in lexicographic order; defines output column positions.
    pub classes: Vec<String>,
    /// Feature names in matrix column order.
    pub feature_names: Vec<String>,
    pub learning_rate: f64,
    pub max_iterations: usize,
    pub regularization: f64,
    pub seed: u64,
    /// Cross-entropy cost per iteration, in order.
    pub cost_history: Vec<f64>,
}

/// Metadata describing a classifier, for display by callers.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub n_features: usize,
    pub classes: Vec<String>,
    pub learning_rate: f64,
    pub max_iterations: usize,
    pub regularization: f64,
    pub trained: bool,
}

/// From-scratch multinomial logistic regression classifier.
///
/// State machine: Unfitted until `fit` or `load` succeeds; every inference
/// or persistence method returns [`Error::NotFitted`] before that.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    config: TrainingConfig,
    params: Option<ModelParameters>,
}

impl LogisticRegression {
    pub fn new(config: TrainingConfig) -> Self {
        LogisticRegression {
            config,
            params: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Class labels in output-column order.
    pub fn classes(&self) -> Result<&[String]> {
        Ok(&self.fitted()?.classes)
    }

    pub fn feature_names(&self) -> Result<&[String]> {
        Ok(&self.fitted()?.feature_names)
    }

    pub fn cost_history(&self) -> Result<&[f64]> {
        Ok(&self.fitted()?.cost_history)
    }

    fn fitted(&self) -> Result<&ModelParameters> {
        self.params.as_ref().ok_or(Error::NotFitted)
    }

    /// Train on `x` (samples x features) with string labels `y`.
    ///
    /// Classes are the lexicographically sorted distinct labels. Weights are
    /// drawn from Normal(0, 0.01) under the seeded RNG so identical inputs
    /// produce identical models. Runs exactly `max_iterations` steps; with a
    /// zero budget the model is still marked fitted, with an empty cost
    /// history and near-random predictions.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[String], feature_names: Option<&[String]>) -> Result<()> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(Error::Validation(
                "training matrix must have at least one row and one column".to_string(),
            ));
        }
        if y.len() != n_samples {
            return Err(Error::Shape(format!(
                "feature matrix has {} rows, label vector has {}",
                n_samples,
                y.len()
            )));
        }
        let feature_names: Vec<String> = match feature_names {
            Some(names) => {
                if names.len() != n_features {
                    return Err(Error::Shape(format!(
                        "{} feature names for {} matrix columns",
                        names.len(),
                        n_features
                    )));
                }
                names.to_vec()
            }
            None => (0..n_features).map(|i| format!("feature_{}", i)).collect(),
        };

        let classes: Vec<String> = y
            .iter()
            .cloned()
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        let n_classes = classes.len();
        let y_encoded = one_hot(y, &classes);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let normal = Normal::new(0.0, WEIGHT_INIT_STD).expect("valid normal distribution");
        let mut weights =
            Array2::from_shape_fn((n_features, n_classes), |_| normal.sample(&mut rng));
        let mut bias = Array2::<f64>::zeros((1, n_classes));

        let n_samples_f = n_samples as f64;
        let mut cost_history = Vec::with_capacity(self.config.max_iterations);

        for iteration in 0..self.config.max_iterations {
            let logits = x.dot(&weights) + &bias;
            let probs = softmax(&logits);

            let cost = cross_entropy(&y_encoded, &probs)
                + self.config.regularization * weights.mapv(|w| w * w).sum();
            cost_history.push(cost);

            let diff = &probs - &y_encoded;
            let mut dw = x.t().dot(&diff) / n_samples_f;
            dw += &(&weights * self.config.regularization);
            let db = diff
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(n_classes))
                .insert_axis(Axis(0));

            weights.scaled_add(-self.config.learning_rate, &dw);
            bias.scaled_add(-self.config.learning_rate, &db);

            if iteration % 100 == 0 {
                log::debug!("iteration {}, cost {:.4}", iteration, cost);
            }
        }

        if let Some(final_cost) = cost_history.last() {
            log::info!("training complete, final cost {:.4}", final_cost);
        }

        self.params = Some(ModelParameters {
            weights,
            bias,
            classes,
            feature_names,
            learning_rate: self.config.learning_rate,
            max_iterations: self.config.max_iterations,
            regularization: self.config.regularization,
            seed: self.config.seed,
            cost_history,
        });
        Ok(())
    }

    /// Class probabilities for every row; columns follow the class list.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let params = self.fitted()?;
        if x.ncols() != params.weights.nrows() {
            return Err(Error::Shape(format!(
                "input has {} features, model was trained on {}",
                x.ncols(),
                params.weights.nrows()
            )));
        }
        let logits = x.dot(&params.weights) + &params.bias;
        Ok(softmax(&logits))
    }

    /// Predicted class label per row, the argmax of [`Self::predict_proba`].
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<String>> {
        let params = self.fitted()?;
        let probs = self.predict_proba(x)?;
        let labels = probs
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                let mut best_value = f64::NEG_INFINITY;
                for (idx, &p) in row.iter().enumerate() {
                    if p > best_value {
                        best_value = p;
                        best = idx;
                    }
                }
                params.classes[best].clone()
            })
            .collect();
        Ok(labels)
    }

    /// Mean absolute weight per feature across classes, normalized to sum
    /// to 1.
    pub fn feature_importance(&self) -> Result<BTreeMap<String, f64>> {
        let params = self.fitted()?;
        let n_classes = params.classes.len() as f64;
        let raw: Vec<f64> = params
            .weights
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|w| w.abs()).sum::<f64>() / n_classes)
            .collect();
        let total: f64 = raw.iter().sum();

        let mut importance = BTreeMap::new();
        for (name, value) in params.feature_names.iter().zip(&raw) {
            let share = if total > 0.0 {
                value / total
            } else {
                1.0 / raw.len() as f64
            };
            importance.insert(name.clone(), share);
        }
        Ok(importance)
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            model_type: "LogisticRegression (multinomial, batch gradient descent)".to_string(),
            n_features: self
                .params
                .as_ref()
                .map(|p| p.feature_names.len())
                .unwrap_or(0),
            classes: self
                .params
                .as_ref()
                .map(|p| p.classes.clone())
                .unwrap_or_default(),
            learning_rate: self.config.learning_rate,
            max_iterations: self.config.max_iterations,
            regularization: self.config.regularization,
            trained: self.is_fitted(),
        }
    }

    /// Serialize the complete parameter set to an opaque binary blob.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let params = self.fitted()?;
        let bytes = bincode::serialize(params)
            .map_err(|e| Error::Persistence(format!("failed to encode model: {}", e)))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| Error::Persistence(format!("failed to write model file: {}", e)))?;
        Ok(())
    }

    /// Restore a fitted classifier from a blob written by [`Self::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Persistence(format!(
                "model file not found: {}",
                path.display()
            )));
        }
        let bytes = std::fs::read(path)
            .map_err(|e| Error::Persistence(format!("failed to read model file: {}", e)))?;
        let params: ModelParameters = bincode::deserialize(&bytes)
            .map_err(|e| Error::Persistence(format!("failed to decode model: {}", e)))?;
        let config = TrainingConfig {
            learning_rate: params.learning_rate,
            max_iterations: params.max_iterations,
            regularization: params.regularization,
            seed: params.seed,
        };
        Ok(LogisticRegression {
            config,
            params: Some(params),
        })
    }
}

/// Numerically stabilized softmax over the rows of `z`: the per-row maximum
/// is subtracted before exponentiating, so the result is invariant to adding
/// a constant to all logits in a row.
pub fn softmax(z: &Array2<f64>) -> Array2<f64> {
    let mut out = z.clone();
    for mut row in out.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|v| v / sum);
        }
    }
    out
}

/// Mean cross-entropy of predicted probabilities against one-hot targets,
/// with probabilities clipped away from {0, 1}.
fn cross_entropy(y_true: &Array2<f64>, y_pred: &Array2<f64>) -> f64 {
    let clipped = y_pred.mapv(|p| p.clamp(COST_EPSILON, 1.0 - COST_EPSILON));
    let per_sample = (y_true * &clipped.mapv(f64::ln)).sum_axis(Axis(1));
    -per_sample.mean().unwrap_or(0.0)
}

fn one_hot(y: &[String], classes: &[String]) -> Array2<f64> {
    let mut encoded = Array2::<f64>::zeros((y.len(), classes.len()));
    for (i, label) in y.iter().enumerate() {
        if let Some(j) = classes.iter().position(|c| c == label) {
            encoded[(i, j)] = 1.0;
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Array2<f64>, Vec<String>) {
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![
                1.0, 0.0, //
                0.9, 0.1, //
                1.1, -0.1, //
                0.0, 1.0, //
                0.1, 0.9, //
                -0.1, 1.1, //
            ],
        )
        .unwrap();
        let y = vec![
            "alto".to_string(),
            "alto".to_string(),
            "alto".to_string(),
            "bajo".to_string(),
            "bajo".to_string(),
            "bajo".to_string(),
        ];
        (x, y)
    }

    #[test]
    fn softmax_rows_sum_to_one() {
        let z = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, -5.0, 0.0, 5.0]).unwrap();
        let p = softmax(&z);
        for row in p.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn softmax_is_shift_invariant() {
        let z = Array2::from_shape_vec((1, 3), vec![1.0, 2.0, 3.0]).unwrap();
        let shifted = z.mapv(|v| v + 1000.0);
        let a = softmax(&z);
        let b = softmax(&shifted);
        for (u, v) in a.iter().zip(b.iter()) {
            assert!((u - v).abs() < 1e-9);
        }
    }

    #[test]
    fn fit_separates_toy_classes() {
        let (x, y) = toy_data();
        let mut model = LogisticRegression::new(TrainingConfig {
            learning_rate: 0.5,
            max_iterations: 500,
            regularization: 0.0,
            ..TrainingConfig::default()
        });
        model.fit(&x, &y, None).unwrap();
        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions, y);
        assert_eq!(model.cost_history().unwrap().len(), 500);
    }

    #[test]
    fn unfitted_model_rejects_inference() {
        let model = LogisticRegression::new(TrainingConfig::default());
        let (x, _) = toy_data();
        assert!(matches!(model.predict(&x), Err(Error::NotFitted)));
        assert!(matches!(model.predict_proba(&x), Err(Error::NotFitted)));
        assert!(matches!(model.feature_importance(), Err(Error::NotFitted)));
    }

    #[test]
    fn identical_seeds_produce_identical_models() {
        let (x, y) = toy_data();
        let config = TrainingConfig::default().with_seed(7);
        let mut a = LogisticRegression::new(config.clone());
        let mut b = LogisticRegression::new(config);
        a.fit(&x, &y, None).unwrap();
        b.fit(&x, &y, None).unwrap();
        let pa = a.predict_proba(&x).unwrap();
        let pb = b.predict_proba(&x).unwrap();
        assert_eq!(pa, pb);
    }
}
