//! Multiclass evaluation: accuracy, weighted precision/recall/F1, confusion
//! matrix, per-class report, and contiguous k-fold cross-validation.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array2, Axis};
use serde::Serialize;

use crate::config::TrainingConfig;
use crate::error::{Error, Result};
use crate::models::logistic::LogisticRegression;

/// Metrics for a single class in the classification report.
#[derive(Debug, Clone, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Full classification report: global weighted metrics, per-class breakdown,
/// confusion matrix, and the class list defining matrix order.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub precision_weighted: f64,
    pub recall_weighted: f64,
    pub f1_score_weighted: f64,
    pub per_class: BTreeMap<String, ClassMetrics>,
    pub confusion_matrix: Vec<Vec<usize>>,
    pub classes: Vec<String>,
}

/// Principal metrics as percentages rounded to two decimals, for display.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Per-fold cross-validation accuracies with their mean and population std.
#[derive(Debug, Clone, Serialize)]
pub struct CrossValidation {
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CrossValidation {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len() as f64;
        let mean = if n > 0.0 {
            scores.iter().sum::<f64>() / n
        } else {
            0.0
        };
        let std = if n > 0.0 {
            (scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n).sqrt()
        } else {
            0.0
        };
        CrossValidation { scores, mean, std }
    }
}

/// Metric computation over one fixed prediction set.
///
/// Constructed once from `(y_true, y_pred, y_proba?)`; the class universe is
/// the sorted union of the distinct values in both label vectors, and every
/// metric is recomputed on demand from the stored vectors.
pub struct Evaluator {
    y_true: Vec<String>,
    y_pred: Vec<String>,
    y_proba: Option<Array2<f64>>,
    classes: Vec<String>,
}

impl Evaluator {
    pub fn new(
        y_true: Vec<String>,
        y_pred: Vec<String>,
        y_proba: Option<Array2<f64>>,
    ) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(Error::Shape(format!(
                "y_true has {} entries, y_pred has {}",
                y_true.len(),
                y_pred.len()
            )));
        }
        if let Some(proba) = &y_proba {
            if proba.nrows() != y_true.len() {
                return Err(Error::Shape(format!(
                    "probability matrix has {} rows, y_true has {}",
                    proba.nrows(),
                    y_true.len()
                )));
            }
        }
        let classes: Vec<String> = y_true
            .iter()
            .chain(y_pred.iter())
            .cloned()
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        Ok(Evaluator {
            y_true,
            y_pred,
            y_proba,
            classes,
        })
    }

    /// Class universe, in the order used by the confusion matrix.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn probabilities(&self) -> Option<&Array2<f64>> {
        self.y_proba.as_ref()
    }

    /// Exact-match fraction; 0 on an empty prediction set.
    pub fn accuracy(&self) -> f64 {
        if self.y_true.is_empty() {
            return 0.0;
        }
        let correct = self
            .y_true
            .iter()
            .zip(&self.y_pred)
            .filter(|(t, p)| t == p)
            .count();
        correct as f64 / self.y_true.len() as f64
    }

    /// (tp, fp, false negatives, support) for one class.
    fn class_counts(&self, class: &str) -> (usize, usize, usize, usize) {
        let mut tp = 0;
        let mut fp = 0;
        let mut fn_ = 0;
        let mut support = 0;
        for (t, p) in self.y_true.iter().zip(&self.y_pred) {
            let is_true = t == class;
            let is_pred = p == class;
            if is_true {
                support += 1;
            }
            match (is_true, is_pred) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }
        (tp, fp, fn_, support)
    }

    /// Support-weighted precision over the full class universe. A class with
    /// no positive predictions contributes 0; returns 0 when total support
    /// is 0.
    pub fn precision(&self) -> f64 {
        self.weighted_metric(|tp, fp, _fn| {
            if tp + fp == 0 {
                0.0
            } else {
                tp as f64 / (tp + fp) as f64
            }
        })
    }

    /// Support-weighted recall over the full class universe.
    pub fn recall(&self) -> f64 {
        self.weighted_metric(|tp, _fp, fn_| {
            if tp + fn_ == 0 {
                0.0
            } else {
                tp as f64 / (tp + fn_) as f64
            }
        })
    }

    /// Harmonic mean of weighted precision and recall; 0 when both are 0.
    pub fn f1_score(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        if precision + recall == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / (precision + recall)
    }

    fn weighted_metric<F>(&self, metric: F) -> f64
    where
        F: Fn(usize, usize, usize) -> f64,
    {
        let mut weighted_sum = 0.0;
        let mut total_weight = 0usize;
        for class in &self.classes {
            let (tp, fp, fn_, support) = self.class_counts(class);
            weighted_sum += metric(tp, fp, fn_) * support as f64;
            total_weight += support;
        }
        if total_weight == 0 {
            return 0.0;
        }
        weighted_sum / total_weight as f64
    }

    /// k x k matrix indexed by class order: `cm[true][pred]`.
    pub fn confusion_matrix(&self) -> Vec<Vec<usize>> {
        let index: BTreeMap<&str, usize> = self
            .classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let k = self.classes.len();
        let mut matrix = vec![vec![0usize; k]; k];
        for (t, p) in self.y_true.iter().zip(&self.y_pred) {
            if let (Some(&ti), Some(&pi)) = (index.get(t.as_str()), index.get(p.as_str())) {
                matrix[ti][pi] += 1;
            }
        }
        matrix
    }

    pub fn classification_report(&self) -> ClassificationReport {
        let mut per_class = BTreeMap::new();
        for class in &self.classes {
            let (tp, fp, fn_, support) = self.class_counts(class);
            let precision = if tp + fp > 0 {
                tp as f64 / (tp + fp) as f64
            } else {
                0.0
            };
            let recall = if tp + fn_ > 0 {
                tp as f64 / (tp + fn_) as f64
            } else {
                0.0
            };
            let f1_score = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            per_class.insert(
                class.clone(),
                ClassMetrics {
                    precision,
                    recall,
                    f1_score,
                    support,
                },
            );
        }
        ClassificationReport {
            accuracy: self.accuracy(),
            precision_weighted: self.precision(),
            recall_weighted: self.recall(),
            f1_score_weighted: self.f1_score(),
            per_class,
            confusion_matrix: self.confusion_matrix(),
            classes: self.classes.clone(),
        }
    }

    /// Principal metrics converted to percentages rounded to two decimals.
    pub fn metrics_summary(&self) -> MetricsSummary {
        MetricsSummary {
            accuracy: round_percent(self.accuracy()),
            precision: round_percent(self.precision()),
            recall: round_percent(self.recall()),
            f1_score: round_percent(self.f1_score()),
        }
    }
}

fn round_percent(value: f64) -> f64 {
    (value * 100.0 * 100.0).round() / 100.0
}

/// Contiguous (unshuffled) k-fold cross-validation.
///
/// Splits the arrays in their existing order; `folds` is clamped to the
/// sample count and the last fold absorbs any remainder. Each fold retrains
/// a fresh classifier with the given hyperparameters on the remaining rows
/// and scores accuracy on the held-out block. Returns the per-fold
/// accuracies in order.
pub fn cross_validation_score(
    config: &TrainingConfig,
    x: &Array2<f64>,
    y: &[String],
    folds: usize,
) -> Result<Vec<f64>> {
    let n_samples = x.nrows();
    if y.len() != n_samples {
        return Err(Error::Shape(format!(
            "feature matrix has {} rows, label vector has {}",
            n_samples,
            y.len()
        )));
    }
    if n_samples == 0 {
        return Ok(Vec::new());
    }
    let folds = folds.clamp(1, n_samples);
    let fold_size = n_samples / folds;

    let mut scores = Vec::with_capacity(folds);
    for fold in 0..folds {
        let start = fold * fold_size;
        let end = if fold < folds - 1 {
            start + fold_size
        } else {
            n_samples
        };

        let train_indices: Vec<usize> = (0..start).chain(end..n_samples).collect();
        let val_indices: Vec<usize> = (start..end).collect();

        let x_train = x.select(Axis(0), &train_indices);
        let y_train: Vec<String> = train_indices.iter().map(|&i| y[i].clone()).collect();
        let x_val = x.select(Axis(0), &val_indices);
        let y_val: Vec<&String> = val_indices.iter().map(|&i| &y[i]).collect();

        let mut model = LogisticRegression::new(config.clone());
        model.fit(&x_train, &y_train, None)?;
        let predictions = model.predict(&x_val)?;

        let correct = predictions
            .iter()
            .zip(&y_val)
            .filter(|(p, t)| p == *t)
            .count();
        scores.push(correct as f64 / y_val.len() as f64);
    }

    Ok(scores)
}
