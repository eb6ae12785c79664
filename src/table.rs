//! Tabular data structures shared by the cleaning pipeline and the trainer.
//!
//! `RawTable` carries a just-parsed upload: ordered, named columns of string
//! cells with no invariants. `CleanTable` is the output of the cleaning
//! pipeline: a finite numeric feature matrix paired with a normalized label
//! vector. The core never accepts untyped data past this boundary.

use std::collections::BTreeMap;
use std::path::Path;

use ndarray::Array2;
use serde::Serialize;

use crate::error::{Error, Result};

/// The 9 feature columns, in the fixed order used everywhere in the crate
/// (matrix columns, scaler stats, single-record inference).
pub const FEATURE_COLUMNS: [&str; 9] = [
    "promedio_actual",
    "asistencia_clases",
    "tareas_entregadas",
    "participacion_clase",
    "horas_estudio",
    "promedio_evaluaciones",
    "cursos_reprobados",
    "actividades_extracurriculares",
    "reportes_disciplinarios",
];

/// Name of the label column.
pub const LABEL_COLUMN: &str = "riesgo";

/// A raw tabular upload: named columns and row-major string cells.
///
/// No invariants beyond rectangular shape are guaranteed until the table has
/// been through [`crate::cleaning::DataCleaner`].
#[derive(Debug, Clone)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append one record. The cell count must match the header width.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Shape(format!(
                "record has {} fields, header has {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of a named column in row order, or `None` if absent.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }
}

/// A cleaned, model-ready table: 9 finite f64 feature columns (order =
/// [`FEATURE_COLUMNS`]) and one normalized label per row.
#[derive(Debug, Clone)]
pub struct CleanTable {
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
    pub labels: Vec<String>,
}

impl CleanTable {
    pub fn new(features: Array2<f64>, labels: Vec<String>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(Error::Shape(format!(
                "feature matrix has {} rows, label vector has {}",
                features.nrows(),
                labels.len()
            )));
        }
        if features.ncols() != FEATURE_COLUMNS.len() {
            return Err(Error::Shape(format!(
                "feature matrix has {} columns, expected {}",
                features.ncols(),
                FEATURE_COLUMNS.len()
            )));
        }
        Ok(Self {
            feature_names: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            features,
            labels,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    /// Count of labels per class, in deterministic (sorted) order.
    pub fn label_distribution(&self) -> BTreeMap<String, usize> {
        let mut dist = BTreeMap::new();
        for label in &self.labels {
            *dist.entry(label.clone()).or_insert(0) += 1;
        }
        dist
    }

    /// Derived read-only view of the cleaned data. Cleaning guarantees the
    /// null count is zero; it is reported anyway so callers can display it.
    pub fn summary(&self) -> DataSummary {
        let null_values = self.features.iter().filter(|v| !v.is_finite()).count();
        let mut columns: Vec<String> = self.feature_names.clone();
        columns.push(LABEL_COLUMN.to_string());
        DataSummary {
            rows: self.n_rows(),
            columns,
            null_values,
            label_distribution: self.label_distribution(),
        }
    }

    /// Write the cleaned table as CSV (features in fixed order, then label).
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())
            .map_err(|e| Error::Persistence(format!("failed to create csv: {}", e)))?;
        let mut header: Vec<&str> = self.feature_names.iter().map(|s| s.as_str()).collect();
        header.push(LABEL_COLUMN);
        writer
            .write_record(&header)
            .map_err(|e| Error::Persistence(format!("failed to write csv header: {}", e)))?;
        for (row, label) in self.features.rows().into_iter().zip(&self.labels) {
            let mut record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            record.push(label.clone());
            writer
                .write_record(&record)
                .map_err(|e| Error::Persistence(format!("failed to write csv record: {}", e)))?;
        }
        writer
            .flush()
            .map_err(|e| Error::Persistence(format!("failed to flush csv: {}", e)))?;
        Ok(())
    }
}

/// Statistics summary of a cleaned table, ready for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct DataSummary {
    pub rows: usize,
    pub columns: Vec<String>,
    pub null_values: usize,
    pub label_distribution: BTreeMap<String, usize>,
}
