//! Configuration loading and error classification

use std::io::Write;

use trikmeans::benchmark::generate_problem;
use trikmeans::{EngineConfig, ErrorCode, KmeansError, TriKMeans};

#[test]
fn test_load_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"iterations": 7, "num_threads": 2, "tolerance": 0.001, "collect_diagnostics": false}}"#
    )
    .unwrap();

    let config = EngineConfig::load(file.path()).unwrap();
    assert_eq!(config.iterations, 7);
    assert_eq!(config.num_threads, Some(2));
    assert_eq!(config.tolerance, Some(0.001));
    assert!(!config.collect_diagnostics);

    let problem = generate_problem(100, 3, 4, 1).unwrap();
    let result = TriKMeans::new(&problem.points, &problem.centroids, config)
        .unwrap()
        .run()
        .unwrap();
    assert!(result.iterations <= 7);
    assert!(result.diagnostics.is_none());
}

#[test]
fn test_config_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.json");
    let config = EngineConfig::new(12).with_threads(3);
    std::fs::write(&path, config.to_json().unwrap()).unwrap();
    assert_eq!(EngineConfig::load(&path).unwrap(), config);
}

#[test]
fn test_negative_iterations_rejected() {
    let err = EngineConfig::from_json(r#"{"iterations": -1}"#).unwrap_err();
    assert!(matches!(err, KmeansError::Config(_)));
    assert_eq!(err.code(), ErrorCode::INVALID_ARG);
}

#[test]
fn test_invalid_values_rejected() {
    assert!(EngineConfig::from_json(r#"{"iterations": 1, "num_threads": 0}"#).is_err());
    assert!(EngineConfig::from_json(r#"{"iterations": 1, "tolerance": -0.5}"#).is_err());
    assert!(EngineConfig::from_json("not json").is_err());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::load(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, KmeansError::Io(_)));
    assert_eq!(err.code(), ErrorCode::IO_ERROR);
}

#[test]
fn test_configuration_errors_before_setup() {
    let problem = generate_problem(5, 2, 3, 1).unwrap();
    let too_many = generate_problem(6, 2, 6, 1).unwrap();
    let err = TriKMeans::new(&problem.points, &too_many.centroids, EngineConfig::new(1))
        .err()
        .unwrap();
    assert!(err.code().is_configuration());

    let other_dim = generate_problem(5, 3, 2, 1).unwrap();
    let err = TriKMeans::new(&problem.points, &other_dim.centroids, EngineConfig::new(1))
        .err()
        .unwrap();
    assert!(matches!(err, KmeansError::DimensionMismatch { points: 2, centroids: 3 }));
}
