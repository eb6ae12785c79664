//! Integration tests for the data-cleaning pipeline.

use studentguard::cleaning::DataCleaner;
use studentguard::error::Error;
use studentguard::table::{RawTable, FEATURE_COLUMNS, LABEL_COLUMN};

fn header() -> Vec<String> {
    let mut columns: Vec<String> = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.push(LABEL_COLUMN.to_string());
    columns
}

/// Row in feature order: promedio_actual, asistencia_clases,
/// tareas_entregadas, participacion_clase, horas_estudio,
/// promedio_evaluaciones, cursos_reprobados,
/// actividades_extracurriculares, reportes_disciplinarios, riesgo.
fn row(cells: [&str; 10]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn sample_table() -> RawTable {
    let mut table = RawTable::new(header());
    table
        .push_row(row(["8.5", "95", "90", "80", "3", "8.0", "0", "['futbol']", "0", "no riesgo"]))
        .unwrap();
    table
        .push_row(row(["6.0", "70", "65", "50", "2", "6.5", "1", "[]", "1", "riesgo"]))
        .unwrap();
    table
        .push_row(row(["7.0", "110", "-5", "80", "4", "7.0", "0", "teatro", "0", "no riesgo"]))
        .unwrap();
    table
        .push_row(row(["", "80", "75", "nan", "2.5", "null", "0", "['a', 'b', 'c']", "0", "riesgo"]))
        .unwrap();
    table
}

// ---------------------------------------------------------------------------
// Schema validation
// ---------------------------------------------------------------------------

#[test]
fn missing_column_fails_with_schema_error() {
    let columns: Vec<String> = header()
        .into_iter()
        .filter(|c| c != "horas_estudio")
        .collect();
    let mut table = RawTable::new(columns);
    table
        .push_row(vec!["1".to_string(); 9])
        .unwrap();

    let result = DataCleaner::new().clean(&table);
    match result {
        Err(Error::Schema(missing)) => {
            assert_eq!(missing, vec!["horas_estudio".to_string()]);
        }
        other => panic!("expected Schema error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn schema_error_lists_every_missing_column() {
    let table = RawTable::new(vec!["promedio_actual".to_string()]);
    match DataCleaner::new().clean(&table) {
        Err(Error::Schema(missing)) => {
            assert_eq!(missing.len(), 9);
            assert!(missing.contains(&"riesgo".to_string()));
        }
        other => panic!("expected Schema error, got {:?}", other.map(|_| ())),
    }
}

// ---------------------------------------------------------------------------
// Pipeline invariants
// ---------------------------------------------------------------------------

#[test]
fn clean_output_has_no_nulls_and_bounded_percentages() {
    let (clean, log) = DataCleaner::new().clean(&sample_table()).unwrap();

    assert_eq!(clean.n_rows(), 4);
    for value in clean.features.iter() {
        assert!(value.is_finite());
    }
    // asistencia_clases (col 1) and tareas_entregadas (col 2) clipped
    for row in clean.features.rows() {
        assert!((0.0..=100.0).contains(&row[1]));
        assert!((0.0..=100.0).contains(&row[2]));
        assert!((0.0..=100.0).contains(&row[3]));
    }
    assert!(!log.is_empty());
    assert!(log.iter().any(|line| line.contains("step 1")));
    assert!(log.iter().any(|line| line.contains("duplicate")));
}

#[test]
fn binary_labels_map_to_exactly_alto_and_bajo() {
    let (clean, _) = DataCleaner::new().clean(&sample_table()).unwrap();
    let distribution = clean.label_distribution();
    let classes: Vec<&String> = distribution.keys().collect();
    assert_eq!(classes, vec!["alto", "bajo"]);
    assert_eq!(distribution["alto"], 2);
    assert_eq!(distribution["bajo"], 2);
}

#[test]
fn unmapped_labels_become_medio() {
    let mut table = sample_table();
    table
        .push_row(row(["5.0", "60", "55", "40", "1", "5.5", "2", "[]", "3", "desconocido"]))
        .unwrap();
    table
        .push_row(row(["5.1", "61", "56", "41", "1", "5.6", "2", "[]", "3", ""]))
        .unwrap();

    let (clean, _) = DataCleaner::new().clean(&table).unwrap();
    assert_eq!(clean.label_distribution()["medio"], 2);
}

#[test]
fn activity_text_becomes_counts() {
    let (clean, _) = DataCleaner::new().clean(&sample_table()).unwrap();
    let act_col: Vec<f64> = clean.features.column(7).to_vec();
    assert_eq!(act_col, vec![1.0, 0.0, 1.0, 3.0]);
}

#[test]
fn missing_numerics_are_imputed_with_the_median() {
    let (clean, log) = DataCleaner::new().clean(&sample_table()).unwrap();
    // promedio_actual of row 3 was empty; median of {8.5, 6.0, 7.0} = 7.0
    assert!((clean.features[(3, 0)] - 7.0).abs() < 1e-9);
    assert!(log.iter().any(|line| line.contains("promedio_actual: 1 values imputed")));
}

#[test]
fn exact_duplicate_rows_are_removed() {
    let mut table = sample_table();
    // same cells as the first row
    table
        .push_row(row(["8.5", "95", "90", "80", "3", "8.0", "0", "['futbol']", "0", "no riesgo"]))
        .unwrap();

    let (clean, log) = DataCleaner::new().clean(&table).unwrap();
    assert_eq!(clean.n_rows(), 4);
    assert!(log.iter().any(|line| line.contains("removed 1 duplicate")));
}

#[test]
fn csv_upload_flows_through_the_pipeline() {
    let csv_data = "\
promedio_actual,asistencia_clases,tareas_entregadas,participacion_clase,horas_estudio,promedio_evaluaciones,cursos_reprobados,actividades_extracurriculares,reportes_disciplinarios,riesgo
8.5,95,90,80,3,8.0,0,\"['futbol']\",0,no riesgo
6.0,70,65,50,2,6.5,1,[],1,riesgo
";
    let raw = studentguard::io::read_csv_from_reader(csv_data.as_bytes()).unwrap();
    let (clean, _) = DataCleaner::new().clean(&raw).unwrap();
    assert_eq!(clean.n_rows(), 2);
    assert_eq!(
        clean.label_distribution().keys().collect::<Vec<_>>(),
        vec!["alto", "bajo"]
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clean.csv");
    clean.to_csv(&path).unwrap();
    let reloaded = studentguard::io::read_csv(&path).unwrap();
    assert_eq!(reloaded.n_rows(), 2);
    assert_eq!(reloaded.columns().len(), 10);
}

#[test]
fn summary_reports_rows_columns_and_distribution() {
    let (clean, _) = DataCleaner::new().clean(&sample_table()).unwrap();
    let summary = clean.summary();
    assert_eq!(summary.rows, 4);
    assert_eq!(summary.columns.len(), 10);
    assert_eq!(summary.null_values, 0);
    assert_eq!(summary.label_distribution.len(), 2);
}
