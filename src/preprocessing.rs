//! Standardization utilities for the training pipeline.
//!
//! Provides the `Scaler` used by the trainer: per-feature mean/std computed
//! from the training split only, applied to every later matrix including
//! single-record inference input. The stats are serializable so the scaler
//! can be persisted next to the model as a matched pair.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Per-feature standardization statistics (z-score scaler).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Fit a scaler from a matrix where rows are samples and columns are
    /// features. A column with zero standard deviation gets std 1 so the
    /// transform never divides by zero.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        let (nrows, ncols) = x.dim();
        if nrows == 0 || ncols == 0 {
            return Err(Error::Validation(
                "cannot fit a scaler on an empty matrix".to_string(),
            ));
        }

        let nrows_f = nrows as f64;
        let mut mean = vec![0.0f64; ncols];
        for row in x.rows() {
            for (c, v) in row.iter().enumerate() {
                mean[c] += v;
            }
        }
        for m in mean.iter_mut() {
            *m /= nrows_f;
        }

        let mut std = vec![0.0f64; ncols];
        for row in x.rows() {
            for (c, v) in row.iter().enumerate() {
                let d = v - mean[c];
                std[c] += d * d;
            }
        }
        for s in std.iter_mut() {
            *s = (*s / nrows_f).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Ok(Scaler { mean, std })
    }

    /// Standardize every row of `x` with the stored stats.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(Error::Shape(format!(
                "matrix has {} columns, scaler was fit on {}",
                x.ncols(),
                self.mean.len()
            )));
        }
        let mut out = x.clone();
        for mut row in out.rows_mut() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = (*v - self.mean[c]) / self.std[c];
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_computes_column_means() {
        let x = Array2::from_shape_vec((4, 2), vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0])
            .unwrap();
        let sc = Scaler::fit(&x).unwrap();
        assert!((sc.mean[0] - 2.5).abs() < 1e-12);
        assert!((sc.mean[1] - 25.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_gets_unit_std() {
        let x = Array2::from_shape_vec((3, 1), vec![5.0, 5.0, 5.0]).unwrap();
        let sc = Scaler::fit(&x).unwrap();
        assert_eq!(sc.std[0], 1.0);
        let t = sc.transform(&x).unwrap();
        for v in t.iter() {
            assert_eq!(*v, 0.0);
        }
    }

    #[test]
    fn transform_centers_data() {
        let x = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let sc = Scaler::fit(&x).unwrap();
        let t = sc.transform(&x).unwrap();
        let col_mean: f64 = t.iter().sum::<f64>() / 4.0;
        assert!(col_mean.abs() < 1e-12);
    }

    #[test]
    fn empty_matrix_is_rejected() {
        let x = Array2::<f64>::zeros((0, 3));
        assert!(Scaler::fit(&x).is_err());
    }
}
