//! Data-cleaning pipeline turning a raw upload into a model-ready table.
//!
//! The pipeline runs a fixed sequence of steps and appends a human-readable
//! log line for each, so callers can surface exactly what happened to the
//! data. Cleaning has no side effects beyond the returned table and log.

use std::collections::HashSet;

use ndarray::Array2;

use crate::error::{Error, Result};
use crate::stats;
use crate::table::{CleanTable, RawTable, FEATURE_COLUMNS, LABEL_COLUMN};

/// Feature columns coerced directly to numeric in step 2. The two remaining
/// features (`participacion_clase`, `actividades_extracurriculares`) get
/// their own steps.
const PLAIN_NUMERIC_COLUMNS: [&str; 7] = [
    "promedio_actual",
    "asistencia_clases",
    "tareas_entregadas",
    "horas_estudio",
    "promedio_evaluaciones",
    "cursos_reprobados",
    "reportes_disciplinarios",
];

/// Percentage-valued columns clipped to [0, 100].
const PERCENT_COLUMNS: [&str; 2] = ["asistencia_clases", "tareas_entregadas"];

/// Cleaning pipeline for raw student tables.
pub struct DataCleaner;

impl DataCleaner {
    pub fn new() -> Self {
        DataCleaner
    }

    /// Run the full pipeline. Returns the cleaned table and the ordered log
    /// of everything that was done. Fails with [`Error::Schema`] listing
    /// every absent column when the input does not carry the 10 required
    /// ones.
    pub fn clean(&self, raw: &RawTable) -> Result<(CleanTable, Vec<String>)> {
        let mut log_lines = Vec::new();

        // step 1: project to the model columns
        let missing: Vec<String> = FEATURE_COLUMNS
            .iter()
            .chain(std::iter::once(&LABEL_COLUMN))
            .filter(|name| raw.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Schema(missing));
        }
        log_lines.push("step 1: selected the model columns".to_string());
        log_lines.push(format!("selected {} columns", FEATURE_COLUMNS.len() + 1));

        let feature_cells: Vec<Vec<&str>> = FEATURE_COLUMNS
            .iter()
            .map(|name| raw.column(name).unwrap_or_default())
            .collect();
        let label_cells = raw.column(LABEL_COLUMN).unwrap_or_default();
        let n_rows = raw.n_rows();

        let mut columns: Vec<Vec<Option<f64>>> =
            vec![vec![None; n_rows]; FEATURE_COLUMNS.len()];

        // step 2: numeric coercion, then percentage clipping
        log_lines.push("step 2: numeric type coercion".to_string());
        for (idx, name) in FEATURE_COLUMNS.iter().enumerate() {
            if !PLAIN_NUMERIC_COLUMNS.contains(name) {
                continue;
            }
            let before = feature_cells[idx]
                .iter()
                .filter(|cell| is_missing_token(cell))
                .count();
            columns[idx] = feature_cells[idx].iter().map(|c| parse_numeric(c)).collect();
            let after = columns[idx].iter().filter(|v| v.is_none()).count();
            log_lines.push(format!("column {}: nulls before {}, after {}", name, before, after));
        }
        for name in PERCENT_COLUMNS {
            let idx = feature_index(name);
            for value in columns[idx].iter_mut().flatten() {
                *value = value.clamp(0.0, 100.0);
            }
            log_lines.push(format!("column {}: clipped to range 0-100", name));
        }

        // step 3: count extracurricular activities
        log_lines.push("step 3: extracurricular activity counting".to_string());
        let act_idx = feature_index("actividades_extracurriculares");
        columns[act_idx] = feature_cells[act_idx]
            .iter()
            .map(|cell| Some(count_activities(cell)))
            .collect();
        log_lines.push("activities converted to numeric counts".to_string());

        // step 4: normalize class participation
        log_lines.push("step 4: class participation normalization".to_string());
        let part_idx = feature_index("participacion_clase");
        columns[part_idx] = feature_cells[part_idx]
            .iter()
            .map(|cell| parse_numeric(cell).map(|v| v.clamp(0.0, 100.0)))
            .collect();
        log_lines.push("participacion_clase normalized to 0-100".to_string());

        // step 5: map the target label
        log_lines.push("step 5: target label mapping".to_string());
        let mut labels: Vec<Option<String>> = label_cells
            .iter()
            .map(|cell| {
                let normalized = cell.trim().to_lowercase();
                match normalized.as_str() {
                    "no riesgo" => Some("bajo".to_string()),
                    "riesgo" => Some("alto".to_string()),
                    _ => None,
                }
            })
            .collect();
        for label in labels.iter_mut() {
            if label.is_none() {
                *label = Some("medio".to_string());
            }
        }
        log_lines.push("riesgo mapped: no riesgo->bajo, riesgo->alto, other->medio".to_string());

        // step 6: impute remaining missing values
        log_lines.push("step 6: missing value imputation".to_string());
        for (idx, name) in FEATURE_COLUMNS.iter().enumerate() {
            let missing_count = columns[idx].iter().filter(|v| v.is_none()).count();
            if missing_count == 0 {
                continue;
            }
            let present: Vec<f64> = columns[idx].iter().flatten().copied().collect();
            let fill = stats::median(&present).unwrap_or(0.0);
            for value in columns[idx].iter_mut() {
                if value.is_none() {
                    *value = Some(fill);
                }
            }
            log_lines.push(format!("{}: {} values imputed", name, missing_count));
        }
        let missing_labels = labels.iter().filter(|l| l.is_none()).count();
        if missing_labels > 0 {
            let present: Vec<String> = labels.iter().flatten().cloned().collect();
            let fill = stats::mode(&present).unwrap_or_else(|| "medio".to_string());
            for label in labels.iter_mut() {
                if label.is_none() {
                    *label = Some(fill.clone());
                }
            }
            log_lines.push(format!("riesgo: {} values imputed with {}", missing_labels, fill));
        }

        // every cell is concrete from here on
        let mut columns: Vec<Vec<f64>> = columns
            .into_iter()
            .map(|col| col.into_iter().map(|v| v.unwrap_or(0.0)).collect())
            .collect();
        let labels: Vec<String> = labels
            .into_iter()
            .map(|l| l.unwrap_or_else(|| "medio".to_string()))
            .collect();

        // step 7: contain outliers in study hours
        log_lines.push("step 7: outlier containment".to_string());
        let horas_idx = feature_index("horas_estudio");
        if let Some((q1, q3)) = stats::quartiles(&columns[horas_idx]) {
            let iqr = q3 - q1;
            let lower = (q1 - 1.5 * iqr).max(0.0);
            let upper = q3 + 1.5 * iqr;
            for value in columns[horas_idx].iter_mut() {
                *value = value.clamp(lower, upper);
            }
            log_lines.push(format!("horas_estudio clipped to [{:.1}, {:.1}]", lower, upper));
        }

        // step 8: drop exact duplicate rows, first occurrence wins
        let mut seen: HashSet<(Vec<u64>, String)> = HashSet::new();
        let mut kept_rows: Vec<usize> = Vec::new();
        for row in 0..n_rows {
            let key: Vec<u64> = columns.iter().map(|col| col[row].to_bits()).collect();
            if seen.insert((key, labels[row].clone())) {
                kept_rows.push(row);
            }
        }
        let removed = n_rows - kept_rows.len();
        log_lines.push(format!("step 8: removed {} duplicate rows", removed));

        let mut data = Vec::with_capacity(kept_rows.len() * FEATURE_COLUMNS.len());
        for &row in &kept_rows {
            for col in &columns {
                data.push(col[row]);
            }
        }
        let features = Array2::from_shape_vec((kept_rows.len(), FEATURE_COLUMNS.len()), data)
            .map_err(|e| Error::Shape(e.to_string()))?;
        let labels: Vec<String> = kept_rows.iter().map(|&row| labels[row].clone()).collect();

        let clean = CleanTable::new(features, labels)?;
        log_lines.push("cleaning completed successfully".to_string());
        log::info!(
            "cleaned table: {} rows kept, {} duplicates removed",
            clean.n_rows(),
            removed
        );

        Ok((clean, log_lines))
    }
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self::new()
    }
}

fn feature_index(name: &str) -> usize {
    FEATURE_COLUMNS
        .iter()
        .position(|c| *c == name)
        .unwrap_or(0)
}

/// Tokens treated as a missing numeric value.
fn is_missing_token(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
}

/// Coerce a cell to a finite float; unparseable values become missing.
fn parse_numeric(cell: &str) -> Option<f64> {
    if is_missing_token(cell) {
        return None;
    }
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Count extracurricular activities from free-form text.
///
/// Empty, bracket-empty and null-like tokens count 0; a bracketed comma list
/// counts its non-empty trimmed elements; any other non-empty text counts 1.
fn count_activities(cell: &str) -> f64 {
    let text = cell.trim();
    let lowered = text.to_ascii_lowercase();
    if matches!(lowered.as_str(), "" | "[]" | "nan" | "none" | "null") {
        return 0.0;
    }
    if text.starts_with('[') && text.ends_with(']') {
        let inner = text[1..text.len() - 1].trim();
        if inner.is_empty() {
            return 0.0;
        }
        return inner
            .split(',')
            .filter(|element| {
                !element.trim().trim_matches(|c| c == '\'' || c == '"').is_empty()
            })
            .count() as f64;
    }
    1.0
}
