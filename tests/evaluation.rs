//! Integration tests for metrics and cross-validation.

use ndarray::Array2;
use studentguard::config::TrainingConfig;
use studentguard::evaluation::{cross_validation_score, CrossValidation, Evaluator};

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[test]
fn perfect_predictions_give_accuracy_one() {
    let y = labels(&["alto", "bajo", "medio", "alto", "bajo"]);
    let evaluator = Evaluator::new(y.clone(), y, None).unwrap();
    assert_eq!(evaluator.accuracy(), 1.0);
}

#[test]
fn weighted_metrics_stay_in_unit_interval() {
    let y_true = labels(&["alto", "alto", "bajo", "medio", "medio", "medio"]);
    let y_pred = labels(&["alto", "bajo", "bajo", "alto", "medio", "medio"]);
    let evaluator = Evaluator::new(y_true, y_pred, None).unwrap();

    for value in [
        evaluator.accuracy(),
        evaluator.precision(),
        evaluator.recall(),
        evaluator.f1_score(),
    ] {
        assert!((0.0..=1.0).contains(&value), "metric out of range: {}", value);
    }
}

#[test]
fn class_with_no_predictions_contributes_zero_precision() {
    // "medio" is never predicted, so its precision term is 0
    let y_true = labels(&["medio", "medio", "alto"]);
    let y_pred = labels(&["alto", "alto", "alto"]);
    let evaluator = Evaluator::new(y_true, y_pred, None).unwrap();
    // alto: precision 1/3, support 1; medio: precision 0, support 2
    let expected = (1.0 / 3.0) / 3.0;
    assert!((evaluator.precision() - expected).abs() < 1e-12);
}

#[test]
fn report_bundles_all_pieces() {
    let y_true = labels(&["alto", "bajo", "alto", "bajo"]);
    let y_pred = labels(&["alto", "bajo", "bajo", "bajo"]);
    let evaluator = Evaluator::new(y_true, y_pred, None).unwrap();
    let report = evaluator.classification_report();

    assert_eq!(report.classes, labels(&["alto", "bajo"]));
    assert_eq!(report.per_class.len(), 2);
    assert_eq!(report.confusion_matrix.len(), 2);
    assert_eq!(report.per_class["alto"].support, 2);
    let total: usize = report
        .confusion_matrix
        .iter()
        .map(|row| row.iter().sum::<usize>())
        .sum();
    assert_eq!(total, 4);
}

// ---------------------------------------------------------------------------
// Cross-validation
// ---------------------------------------------------------------------------

fn separable_dataset(n: usize) -> (Array2<f64>, Vec<String>) {
    let mut data = Vec::new();
    let mut y = Vec::new();
    for i in 0..n {
        if i % 2 == 0 {
            data.extend_from_slice(&[1.0, 0.0]);
            y.push("alto".to_string());
        } else {
            data.extend_from_slice(&[0.0, 1.0]);
            y.push("bajo".to_string());
        }
    }
    (Array2::from_shape_vec((n, 2), data).unwrap(), y)
}

#[test]
fn five_folds_on_100_samples_give_five_scores() {
    let (x, y) = separable_dataset(100);
    let config = TrainingConfig {
        max_iterations: 100,
        ..TrainingConfig::default()
    };
    let scores = cross_validation_score(&config, &x, &y, 5).unwrap();
    assert_eq!(scores.len(), 5);
    for score in &scores {
        assert!((0.0..=1.0).contains(score));
    }
}

#[test]
fn folds_are_clamped_to_sample_count() {
    let (x, y) = separable_dataset(4);
    let config = TrainingConfig {
        max_iterations: 50,
        ..TrainingConfig::default()
    };
    let scores = cross_validation_score(&config, &x, &y, 10).unwrap();
    assert_eq!(scores.len(), 4);
}

#[test]
fn last_fold_absorbs_the_remainder() {
    // 7 samples, 3 folds: fold size 2, last fold holds 3
    let (x, y) = separable_dataset(7);
    let config = TrainingConfig {
        max_iterations: 50,
        ..TrainingConfig::default()
    };
    let scores = cross_validation_score(&config, &x, &y, 3).unwrap();
    assert_eq!(scores.len(), 3);
}

#[test]
fn cross_validation_summary_mean_and_std() {
    let summary = CrossValidation::from_scores(vec![1.0, 0.5]);
    assert!((summary.mean - 0.75).abs() < 1e-12);
    assert!((summary.std - 0.25).abs() < 1e-12);
    assert_eq!(summary.scores.len(), 2);
}
