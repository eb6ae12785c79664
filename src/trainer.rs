//! Training orchestrator tying cleaning output to classifier + evaluator.
//!
//! `ModelTrainer` is the explicit session object callers own: it holds at
//! most one prepared dataset and one fitted model at a time, and its
//! mutating operations take `&mut self`, so the at-most-one-writer invariant
//! is enforced by the borrow checker rather than documented convention.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::TrainingConfig;
use crate::error::{Error, Result};
use crate::evaluation::{cross_validation_score, ClassificationReport, CrossValidation, Evaluator, MetricsSummary};
use crate::models::logistic::{LogisticRegression, ModelInfo};
use crate::preprocessing::Scaler;
use crate::table::{CleanTable, FEATURE_COLUMNS};

/// File name of the persisted model parameters inside the artifact dir.
pub const MODEL_FILE: &str = "studentguard_model.bin";
/// File name of the persisted scaler stats inside the artifact dir.
pub const SCALER_FILE: &str = "scaler_stats.bin";

/// Fraction of rows assigned to the training split.
const TRAIN_FRACTION: f64 = 0.8;

/// Number of folds used by `evaluate` for cross-validation on the train
/// split.
const EVAL_CV_FOLDS: usize = 5;

/// Split sizes and per-split class distributions returned by `prepare_data`.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedSummary {
    pub train_samples: usize,
    pub test_samples: usize,
    pub features: Vec<String>,
    pub train_distribution: BTreeMap<String, usize>,
    pub test_distribution: BTreeMap<String, usize>,
}

/// Everything `evaluate` computes from the held-out split and the train
/// split. Derived on demand, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutput {
    pub metrics: MetricsSummary,
    pub report: ClassificationReport,
    pub cross_validation: CrossValidation,
    pub feature_importance: BTreeMap<String, f64>,
}

/// Single-record inference result.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub label: String,
    pub probabilities: BTreeMap<String, f64>,
    /// Maximum class probability.
    pub confidence: f64,
}

/// Paths of the persisted model/scaler pair.
#[derive(Debug, Clone, Serialize)]
pub struct ModelPaths {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
}

/// Session object owning the split data, the scaler, and the fitted model.
#[derive(Debug, Default)]
pub struct ModelTrainer {
    model: Option<LogisticRegression>,
    scaler: Option<Scaler>,
    x_train: Option<Array2<f64>>,
    x_test: Option<Array2<f64>>,
    y_train: Option<Vec<String>>,
    y_test: Option<Vec<String>>,
    feature_names: Vec<String>,
}

impl ModelTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Split the cleaned table 80/20 under a seeded permutation and fit the
    /// standardization scaler on the training split only. Replaces any
    /// previously prepared data and invalidates a previously trained model.
    pub fn prepare_data(&mut self, table: &CleanTable, seed: u64) -> Result<PreparedSummary> {
        if table.label_distribution().len() < 2 {
            return Err(Error::InsufficientClasses);
        }

        let n_samples = table.n_rows();
        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        let split_at = (TRAIN_FRACTION * n_samples as f64) as usize;
        let (train_indices, test_indices) = indices.split_at(split_at);

        let x_train = table.features.select(Axis(0), train_indices);
        let x_test = table.features.select(Axis(0), test_indices);
        let y_train: Vec<String> = train_indices.iter().map(|&i| table.labels[i].clone()).collect();
        let y_test: Vec<String> = test_indices.iter().map(|&i| table.labels[i].clone()).collect();

        let scaler = Scaler::fit(&x_train)?;
        let x_train = scaler.transform(&x_train)?;
        let x_test = scaler.transform(&x_test)?;

        let summary = PreparedSummary {
            train_samples: x_train.nrows(),
            test_samples: x_test.nrows(),
            features: table.feature_names.clone(),
            train_distribution: distribution(&y_train),
            test_distribution: distribution(&y_test),
        };
        log::info!(
            "prepared data: {} train rows, {} test rows",
            summary.train_samples,
            summary.test_samples
        );

        self.x_train = Some(x_train);
        self.x_test = Some(x_test);
        self.y_train = Some(y_train);
        self.y_test = Some(y_test);
        self.scaler = Some(scaler);
        self.feature_names = table.feature_names.clone();
        self.model = None;

        Ok(summary)
    }

    /// Fit a fresh classifier on the standardized training split.
    pub fn train(&mut self, config: &TrainingConfig) -> Result<ModelInfo> {
        let (x_train, y_train) = match (&self.x_train, &self.y_train) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(Error::NotPrepared),
        };

        log::info!("starting studentguard model training");
        let mut model = LogisticRegression::new(config.clone());
        model.fit(x_train, y_train, Some(&self.feature_names))?;
        let info = model.info();
        self.model = Some(model);
        log::info!("training finished");
        Ok(info)
    }

    /// Score the fitted model: principal metrics and full report on the
    /// held-out split, 5-fold cross-validation on the train split, and
    /// feature importances. Recomputed from current state on every call.
    pub fn evaluate(&self) -> Result<EvaluationOutput> {
        let model = self.model.as_ref().ok_or(Error::NotFitted)?;
        let (x_test, y_test, x_train, y_train) = match (
            &self.x_test,
            &self.y_test,
            &self.x_train,
            &self.y_train,
        ) {
            (Some(xt), Some(yt), Some(xr), Some(yr)) => (xt, yt, xr, yr),
            _ => return Err(Error::NotPrepared),
        };

        let y_pred = model.predict(x_test)?;
        let y_proba = model.predict_proba(x_test)?;
        let evaluator = Evaluator::new(y_test.clone(), y_pred, Some(y_proba))?;

        let scores = cross_validation_score(model.config(), x_train, y_train, EVAL_CV_FOLDS)?;

        Ok(EvaluationOutput {
            metrics: evaluator.metrics_summary(),
            report: evaluator.classification_report(),
            cross_validation: CrossValidation::from_scores(scores),
            feature_importance: model.feature_importance()?,
        })
    }

    /// Persist the model parameters and scaler stats as a matched pair under
    /// `dir`. Both blobs are fully serialized before anything touches disk.
    pub fn save_model<P: AsRef<Path>>(&self, dir: P) -> Result<ModelPaths> {
        let model = self.model.as_ref().ok_or(Error::NotFitted)?;
        let scaler = self.scaler.as_ref().ok_or(Error::NotFitted)?;

        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let model_path = dir.join(MODEL_FILE);
        let scaler_path = dir.join(SCALER_FILE);

        let scaler_bytes = bincode::serialize(scaler)
            .map_err(|e| Error::Persistence(format!("failed to encode scaler: {}", e)))?;
        model.save(&model_path)?;
        std::fs::write(&scaler_path, scaler_bytes)
            .map_err(|e| Error::Persistence(format!("failed to write scaler file: {}", e)))?;

        Ok(ModelPaths {
            model_path,
            scaler_path,
        })
    }

    /// Restore a persisted model/scaler pair. Fails with
    /// [`Error::Persistence`] when either file is absent: a model without
    /// its scaler would silently predict on unstandardized input.
    pub fn load_model<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        let model_path = dir.join(MODEL_FILE);
        let scaler_path = dir.join(SCALER_FILE);

        let model = LogisticRegression::load(&model_path)?;
        if !scaler_path.exists() {
            return Err(Error::Persistence(format!(
                "scaler file not found: {}",
                scaler_path.display()
            )));
        }
        let bytes = std::fs::read(&scaler_path)
            .map_err(|e| Error::Persistence(format!("failed to read scaler file: {}", e)))?;
        let scaler: Scaler = bincode::deserialize(&bytes)
            .map_err(|e| Error::Persistence(format!("failed to decode scaler: {}", e)))?;

        self.feature_names = model.feature_names()?.to_vec();
        self.model = Some(model);
        self.scaler = Some(scaler);
        Ok(())
    }

    /// Predict the risk category for a single student record.
    ///
    /// The record must carry all 9 feature fields (see
    /// [`FEATURE_COLUMNS`]); any absent field fails with
    /// [`Error::Validation`] naming it. The stored scaler transform is
    /// applied before inference.
    pub fn predict_one(&self, record: &HashMap<String, f64>) -> Result<Prediction> {
        let model = self.model.as_ref().ok_or(Error::NotFitted)?;
        let scaler = self.scaler.as_ref().ok_or(Error::NotFitted)?;

        let missing: Vec<&str> = FEATURE_COLUMNS
            .iter()
            .filter(|name| !record.contains_key(**name))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "missing field(s): {}",
                missing.join(", ")
            )));
        }

        let values: Vec<f64> = FEATURE_COLUMNS.iter().map(|name| record[*name]).collect();
        let x = Array2::from_shape_vec((1, FEATURE_COLUMNS.len()), values)
            .map_err(|e| Error::Shape(e.to_string()))?;
        let x = scaler.transform(&x)?;

        let labels = model.predict(&x)?;
        let proba = model.predict_proba(&x)?;
        let classes = model.classes()?;

        let mut probabilities = BTreeMap::new();
        let mut confidence = 0.0f64;
        for (class, &p) in classes.iter().zip(proba.row(0).iter()) {
            probabilities.insert(class.clone(), p);
            confidence = confidence.max(p);
        }
        let label = labels
            .into_iter()
            .next()
            .ok_or_else(|| Error::Shape("empty prediction".to_string()))?;

        Ok(Prediction {
            label,
            probabilities,
            confidence,
        })
    }
}

fn distribution(labels: &[String]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.clone()).or_insert(0) += 1;
    }
    counts
}
