//! End-to-end tests of the train→test experiment runner

use std::path::{Path, PathBuf};
use tabtrain::context::RunState;
use tabtrain::experiment::{Experiment, ExperimentConfig};
use tabtrain::store::ModelStore;
use tabtrain::TabTrainError;

const TRAIN_CSV: &str = "\
Label,f1,f2
1.0,1.0,2.0
2.0,2.0,1.5
3.0,3.0,4.0
4.0,4.0,3.5
5.0,5.0,5.5
6.0,6.0,6.0
";

const TEST_CSV: &str = "\
Label,f1,f2
1.5,1.5,2.0
4.5,4.5,4.0
";

const BINARY_TRAIN_CSV: &str = "\
Label,f1
0,-2.0
0,-1.5
0,-1.0
1,1.0
1,1.5
1,2.0
";

const BINARY_TEST_CSV: &str = "\
Label,f1
0,-1.8
1,1.8
";

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn base_config(dir: &Path) -> ExperimentConfig {
    let train = write_file(dir, "train.csv", TRAIN_CSV);
    let test = write_file(dir, "test.csv", TEST_CSV);
    let mut config = ExperimentConfig::new(train, test);
    config.trainer = "linear".to_string();
    config
}

#[test]
fn test_default_run_reports_overall_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let config = base_config(dir.path());

    let result = Experiment::new(config).unwrap().run().unwrap();

    assert_eq!(result.final_state, RunState::Reported);
    assert!(result.advisories.is_empty());
    let overall = result.metrics.overall().unwrap();
    assert_eq!(overall.height(), 1);
    assert!(overall.width() > 0);
}

#[test]
fn test_unsupported_validation_degrades_with_one_advisory() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config(dir.path());
    // The linear trainer declines validation data.
    config.valid_file = Some(write_file(dir.path(), "valid.csv", TEST_CSV));

    let result = Experiment::new(config).unwrap().run().unwrap();

    assert_eq!(result.final_state, RunState::Reported);
    assert_eq!(result.advisories.len(), 1);
    assert!(result.advisories[0].contains("validation"));
}

#[test]
fn test_supported_validation_produces_no_advisory() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.trainer = "sgd".to_string();
    config.valid_file = Some(write_file(dir.path(), "valid.csv", TEST_CSV));

    let result = Experiment::new(config).unwrap().run().unwrap();

    assert_eq!(result.final_state, RunState::Reported);
    assert!(result.advisories.is_empty());
}

#[test]
fn test_missing_input_model_degrades_and_completes() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.input_model = Some(dir.path().join("no_such_model.json"));

    let result = Experiment::new(config).unwrap().run().unwrap();

    assert_eq!(result.final_state, RunState::Reported);
    assert_eq!(result.advisories.len(), 1);
    assert!(result.advisories[0].contains("input model"));
}

#[test]
fn test_continue_training_from_saved_model() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("model.json");

    let mut first = base_config(dir.path());
    first.output_model = Some(model_path.clone());
    Experiment::new(first).unwrap().run().unwrap();
    assert!(model_path.exists());

    let mut second = base_config(dir.path());
    second.input_model = Some(model_path);
    let result = Experiment::new(second).unwrap().run().unwrap();

    assert_eq!(result.final_state, RunState::Reported);
    assert!(result.advisories.is_empty());
}

#[test]
fn test_per_instance_output_aligns_with_test_rows() {
    let dir = tempfile::tempdir().unwrap();
    let predictions = dir.path().join("predictions.csv");
    let mut config = base_config(dir.path());
    config.output_predictions = Some(predictions.clone());

    Experiment::new(config).unwrap().run().unwrap();

    let written = std::fs::read_to_string(&predictions).unwrap();
    let mut lines = written.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("Instance,"));
    // Header plus one row per test instance.
    assert_eq!(lines.count(), 2);
    // Feature columns never appear in the per-instance view.
    assert!(!header.contains("f1"));
}

#[test]
fn test_saved_model_round_trips_identically() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    let mut config = base_config(dir.path());
    config.output_model = Some(model_path.clone());

    Experiment::new(config).unwrap().run().unwrap();

    let a = ModelStore::open(&model_path).unwrap();
    let b = ModelStore::open(&model_path).unwrap();
    assert_eq!(a.artifact(), b.artifact());
}

#[test]
fn test_binary_labels_select_classification_and_calibrate() {
    let dir = tempfile::tempdir().unwrap();
    let train = write_file(dir.path(), "train.csv", BINARY_TRAIN_CSV);
    let test = write_file(dir.path(), "test.csv", BINARY_TEST_CSV);

    let mut config = ExperimentConfig::new(train, test);
    config.trainer = "logistic".to_string();

    let result = Experiment::new(config).unwrap().run().unwrap();
    let overall = result.metrics.overall().unwrap();
    assert!(overall.column("Accuracy").is_ok());
    // The platt-calibrated classifier emits probabilities, so log-loss is
    // part of the overall view.
    assert!(overall.column("LogLoss").is_ok());
}

#[test]
fn test_summary_file_receives_overall_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let summary = dir.path().join("summary.txt");
    let mut config = base_config(dir.path());
    config.summary = Some(summary.clone());

    Experiment::new(config).unwrap().run().unwrap();

    let written = std::fs::read_to_string(&summary).unwrap();
    assert!(written.contains("RMSE"));
}

#[test]
fn test_unwritable_summary_is_an_advisory_not_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.summary = Some(PathBuf::from("/nonexistent/dir/summary.txt"));

    let result = Experiment::new(config).unwrap().run().unwrap();

    assert_eq!(result.final_state, RunState::Reported);
    assert_eq!(result.advisories.len(), 1);
    assert!(result.advisories[0].contains("summary"));
}

#[test]
fn test_declared_roles_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let train = write_file(
        dir.path(),
        "train.csv",
        "y,x1,x2\n1.0,1.0,2.0\n2.0,2.0,1.5\n3.0,3.0,4.0\n4.0,4.0,3.5\n",
    );
    let test = write_file(dir.path(), "test.csv", "y,x1,x2\n1.5,1.5,2.0\n");

    let mut config = ExperimentConfig::new(train, test);
    config.trainer = "linear".to_string();
    config.label = Some("y".to_string());
    config.features = vec!["x1".to_string(), "x2".to_string()];

    let result = Experiment::new(config).unwrap().run().unwrap();
    assert_eq!(result.final_state, RunState::Reported);
}

#[test]
fn test_missing_declared_column_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.weight = Some("SampleWeight".to_string());

    let err = Experiment::new(config).unwrap().run().unwrap_err();
    match err {
        TabTrainError::MissingColumn { key, column } => {
            assert_eq!(key, "weightColumn");
            assert_eq!(column, "SampleWeight");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_test_file_missing_training_column_fails_replay() {
    let dir = tempfile::tempdir().unwrap();
    let train = write_file(dir.path(), "train.csv", TRAIN_CSV);
    let test = write_file(dir.path(), "test.csv", "Label,f1\n1.0,1.0\n");

    let mut config = ExperimentConfig::new(train, test);
    config.trainer = "linear".to_string();

    let err = Experiment::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, TabTrainError::SchemaMismatch(_)));
}

#[test]
fn test_normalizing_trainer_replays_identically_on_test() {
    // sgd asks for normalization; the test file must go through the same
    // fitted scaler via the persisted pipeline, so the run completes and
    // scores are finite.
    let dir = tempfile::tempdir().unwrap();
    let predictions = dir.path().join("predictions.csv");
    let mut config = base_config(dir.path());
    config.trainer = "sgd".to_string();
    config.output_predictions = Some(predictions.clone());

    let result = Experiment::new(config).unwrap().run().unwrap();
    assert_eq!(result.final_state, RunState::Reported);

    let written = std::fs::read_to_string(&predictions).unwrap();
    assert!(!written.contains("NaN"));
    assert!(!written.contains("inf"));
}
