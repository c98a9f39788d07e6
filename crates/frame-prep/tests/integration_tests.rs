//! Integration tests for the preparation pipeline.
//!
//! These tests drive the pipeline state end to end over CSV fixtures.

use frame_prep::io::{read_csv_bytes, read_table};
use frame_prep::{
    ImputeMethod, Operation, OutlierIndexSet, PipelineConfig, PipelineState, PrepError, Table,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> Table {
    read_table(fixtures_path().join(filename)).expect("Failed to read fixture")
}

fn loaded_state(filename: &str) -> PipelineState {
    let mut state = PipelineState::new();
    state.load(load_fixture(filename));
    state
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn detect(state: &mut PipelineState, operation: Operation) -> OutlierIndexSet {
    state
        .apply(&operation)
        .expect("Detection should succeed")
        .outliers()
        .cloned()
        .expect("Detection should return an index set")
}

fn floats(table: &Table, column: &str) -> Vec<Option<f64>> {
    table
        .series(column)
        .unwrap()
        .cast(&polars::prelude::DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

// ============================================================================
// Fixture Loading
// ============================================================================

#[test]
fn test_fixture_shape_and_missing_values() {
    let table = load_fixture("passengers.csv");

    assert_eq!(table.height(), 30);
    assert_eq!(table.width(), 7);
    assert_eq!(table.columns_with_missing(), strings(&["Age", "Embarked"]));
    assert_eq!(
        table.categorical_columns(),
        strings(&["Sex", "Embarked"])
    );
}

// ============================================================================
// Full Workflows
// ============================================================================

#[test]
fn test_cleaning_workflow() {
    let mut state = loaded_state("passengers.csv");

    let steps = [
        Operation::RemoveColumns {
            columns: strings(&["PassengerId"]),
        },
        Operation::Impute {
            columns: strings(&["Age"]),
            method: ImputeMethod::Median,
        },
        Operation::Impute {
            columns: strings(&["Embarked"]),
            method: ImputeMethod::Mode,
        },
        Operation::OneHotEncode {
            columns: strings(&["Embarked"]),
        },
        Operation::LabelEncode {
            columns: strings(&["Sex"]),
        },
        Operation::StandardScale {
            columns: strings(&["Fare"]),
        },
        Operation::MinMaxScale {
            columns: strings(&["Age"]),
            range: None,
        },
    ];
    for step in &steps {
        state.apply(step).unwrap();
    }

    let table = state.current().unwrap();
    assert_eq!(
        table.column_names(),
        strings(&[
            "Survived",
            "Pclass",
            "Sex",
            "Age",
            "Fare",
            "Embarked_S",
            "Embarked_C",
            "Embarked_Q",
        ])
    );
    assert_eq!(table.height(), 30);
    assert!(table.columns_with_missing().is_empty());
    assert_eq!(state.operations_applied(), steps.len());
    assert_eq!(state.history().len(), steps.len());

    let ages = floats(table, "Age");
    assert!(ages.iter().flatten().all(|a| (0.0..=1.0).contains(a)));

    // The original is untouched
    assert_eq!(state.original().unwrap().width(), 7);
}

#[test]
fn test_median_imputation_uses_present_values() {
    let mut state = loaded_state("passengers.csv");

    state
        .apply(&Operation::Impute {
            columns: strings(&["Age"]),
            method: ImputeMethod::Median,
        })
        .unwrap();

    let ages = floats(state.current().unwrap(), "Age");
    // Row 6 (index 5) was missing; median of the 24 present ages is 27.5
    assert_eq!(ages[5], Some(27.5));
    assert_eq!(ages[0], Some(22.0));
}

#[test]
fn test_outlier_detection_on_fixture() {
    let mut state = loaded_state("passengers.csv");

    let iqr = detect(
        &mut state,
        Operation::DetectOutliersIqr {
            column: "Fare".to_string(),
        },
    );
    let zscore = detect(
        &mut state,
        Operation::DetectOutliersZscore {
            column: "Fare".to_string(),
        },
    );

    assert_eq!(iqr.positions(), &[1, 27]);
    assert_eq!(zscore.positions(), &[27]);
    assert!(!state.has_modifications());
}

#[test]
fn test_outlier_transform_on_fixture() {
    let mut state = loaded_state("passengers.csv");
    let outliers = detect(
        &mut state,
        Operation::DetectOutliersIqr {
            column: "Fare".to_string(),
        },
    );

    state
        .apply(&Operation::TransformOutliers {
            column: "Fare".to_string(),
            outliers,
        })
        .unwrap();

    let fares = floats(state.current().unwrap(), "Fare");
    assert_eq!(fares.len(), 30);
    assert_eq!(fares[1], Some(14.5));
    assert_eq!(fares[27], Some(14.5));
    assert_eq!(fares[0], Some(7.25));
}

#[test]
fn test_sensor_scenario_remove_and_transform() {
    let mut state = loaded_state("sensors.csv");
    let outliers = detect(
        &mut state,
        Operation::DetectOutliersIqr {
            column: "temperature".to_string(),
        },
    );
    assert_eq!(outliers.positions(), &[5]);

    state
        .apply(&Operation::RemoveOutliers {
            column: "temperature".to_string(),
            outliers: outliers.clone(),
        })
        .unwrap();
    assert_eq!(
        floats(state.current().unwrap(), "temperature"),
        vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]
    );

    // The same set is stale after the removal and after a reset
    let err = state
        .apply(&Operation::TransformOutliers {
            column: "temperature".to_string(),
            outliers: outliers.clone(),
        })
        .unwrap_err();
    assert!(matches!(err, PrepError::StaleIndexSet { .. }));

    state.reset().unwrap();
    let err = state
        .apply(&Operation::TransformOutliers {
            column: "temperature".to_string(),
            outliers,
        })
        .unwrap_err();
    assert!(matches!(err, PrepError::StaleIndexSet { .. }));

    let fresh = detect(
        &mut state,
        Operation::DetectOutliersIqr {
            column: "temperature".to_string(),
        },
    );
    state
        .apply(&Operation::TransformOutliers {
            column: "temperature".to_string(),
            outliers: fresh,
        })
        .unwrap();
    assert_eq!(
        floats(state.current().unwrap(), "temperature"),
        vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(3.0)]
    );
}

#[test]
fn test_operations_from_json() {
    let steps: Vec<Operation> = serde_json::from_str(
        r#"[
            {"op": "drop_missing_rows", "columns": ["Age", "Embarked"]},
            {"op": "label_encode", "columns": ["Sex", "Embarked"]},
            {"op": "min_max_scale", "columns": ["Fare"], "range": [-1.0, 1.0]}
        ]"#,
    )
    .unwrap();
    let mut state = loaded_state("passengers.csv");

    for step in &steps {
        state.apply(step).unwrap();
    }

    let table = state.current().unwrap();
    assert_eq!(table.height(), 23);
    let fares = floats(table, "Fare");
    let min = fares.iter().flatten().copied().fold(f64::INFINITY, f64::min);
    let max = fares.iter().flatten().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!((min, max), (-1.0, 1.0));
}

#[test]
fn test_configured_thresholds() {
    let config = PipelineConfig::builder()
        .iqr_multiplier(20.0)
        .zscore_threshold(0.5)
        .build()
        .unwrap();
    let mut state = PipelineState::with_config(config).unwrap();
    state.load(load_fixture("passengers.csv"));

    let iqr = detect(
        &mut state,
        Operation::DetectOutliersIqr {
            column: "Fare".to_string(),
        },
    );
    let zscore = detect(
        &mut state,
        Operation::DetectOutliersZscore {
            column: "Fare".to_string(),
        },
    );

    assert!(iqr.is_empty());
    assert_eq!(zscore.positions(), &[1, 3, 27]);
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_export_round_trip() {
    let mut state = loaded_state("sensors.csv");
    state
        .apply(&Operation::RemoveColumns {
            columns: strings(&["status"]),
        })
        .unwrap();

    let bytes = state.export_csv().unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.starts_with("reading,temperature\n"));

    let reloaded = read_csv_bytes(&bytes).unwrap();
    assert_eq!(&reloaded, state.current().unwrap());
}

#[test]
fn test_export_to_file_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let state = loaded_state("passengers.csv");

    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    frame_prep::export::write_csv(state.current().unwrap(), &first).unwrap();
    frame_prep::export::write_csv(state.current().unwrap(), &second).unwrap();

    let first = std::fs::read(first).unwrap();
    assert_eq!(first, std::fs::read(second).unwrap());
    assert_eq!(first, state.export_csv().unwrap());
}

// ============================================================================
// Error Handling
// ============================================================================

#[test]
fn test_errors_leave_state_untouched() {
    let mut state = loaded_state("passengers.csv");
    let before = state.current().unwrap().clone();

    let failing = [
        Operation::RemoveColumns {
            columns: strings(&["Cabin"]),
        },
        Operation::StandardScale {
            columns: strings(&["Fare", "Sex"]),
        },
        Operation::Impute {
            columns: vec![],
            method: ImputeMethod::Mean,
        },
        Operation::OneHotEncode {
            columns: strings(&["Cabin"]),
        },
    ];
    let codes: Vec<&str> = failing
        .iter()
        .map(|op| state.apply(op).unwrap_err().error_code())
        .collect();

    assert_eq!(
        codes,
        vec![
            "UNKNOWN_COLUMN",
            "NON_NUMERIC_COLUMN",
            "EMPTY_SELECTION",
            "UNKNOWN_COLUMN"
        ]
    );
    assert_eq!(state.current().unwrap(), &before);
    assert_eq!(state.current().unwrap().generation(), before.generation());
    assert_eq!(state.operations_applied(), 0);
}

#[test]
fn test_error_serializes_for_frontend() {
    let mut state = PipelineState::new();
    let err = state
        .apply(&Operation::LabelEncode {
            columns: strings(&["x"]),
        })
        .unwrap_err();

    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["code"], "NO_DATA_LOADED");
    assert_eq!(json["message"], "No data loaded");
}
