//! Configuration file round trips and validation

use form_tracker::{
    config::{Config, EXAMPLE_CONFIG},
    error::AppError,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("form_tracker.yaml");

    let mut config = Config::default();
    config.session.max_reps = Some(8);
    config.display.mirror = false;
    config.display.processing_width = Some(960);
    config.smoothing.knee_ratio_filter = "median:5".to_string();
    config.output.output_video = Some(PathBuf::from("out/annotated.mp4"));
    config.to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.session.max_reps, Some(8));
    assert!(!loaded.display.mirror);
    assert_eq!(loaded.display.processing_width, Some(960));
    assert_eq!(loaded.smoothing.knee_ratio_filter, "median:5");
    assert_eq!(loaded.output.output_video, Some(PathBuf::from("out/annotated.mp4")));
    loaded.validate().unwrap();
}

#[test]
fn test_example_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("example.yaml");
    fs::write(&path, EXAMPLE_CONFIG).unwrap();

    let config = Config::from_file(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.session.position_lock_frames, 30);
    assert_eq!(config.output.history_file, PathBuf::from("session_results/workout_history.json"));
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.yaml");
    fs::write(&path, "session:\n  max_reps: 5\n").unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.session.max_reps, Some(5));
    assert_eq!(config.session.lost_reset_frames, 30);
    assert!(config.display.mirror);
    assert!((config.detection.min_pose_confidence - 0.3).abs() < 1e-9);
}

#[test]
fn test_infinite_duration_in_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("forever.yaml");
    fs::write(&path, "session:\n  countdown_seconds: .inf\n").unwrap();

    let config = Config::from_file(&path).unwrap();
    match config.validate() {
        Err(AppError::ConfigError(msg)) => assert!(msg.contains("Countdown")),
        other => panic!("Expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "session: [not, a, map").unwrap();

    match Config::from_file(&path) {
        Err(AppError::ConfigError(msg)) => assert!(msg.contains("parse")),
        other => panic!("Expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let result = Config::from_file("does/not/exist.yaml");
    assert!(matches!(result, Err(AppError::Io(_))));
}

#[test]
fn test_validation_failures() {
    let cases: Vec<(&str, Box<dyn Fn(&mut Config)>)> = vec![
        ("pose confidence", Box::new(|c: &mut Config| c.detection.min_pose_confidence = 1.5)),
        ("keypoint confidence", Box::new(|c: &mut Config| c.detection.min_keypoint_confidence = -0.1)),
        ("tricep alpha", Box::new(|c: &mut Config| c.smoothing.tricep_alpha = 0.0)),
        ("knee filter", Box::new(|c: &mut Config| c.smoothing.knee_ratio_filter = "kalman".to_string())),
        ("max reps", Box::new(|c: &mut Config| c.session.max_reps = Some(0))),
        ("lost frames", Box::new(|c: &mut Config| c.session.lost_reset_frames = 5)),
        ("gui mode", Box::new(|c: &mut Config| c.display.gui_mode = "pointers".to_string())),
        ("processing width", Box::new(|c: &mut Config| c.display.processing_width = Some(10))),
        ("infinite countdown", Box::new(|c: &mut Config| c.session.countdown_seconds = f64::INFINITY)),
        ("NaN rest screen", Box::new(|c: &mut Config| c.session.rest_screen_seconds = f64::NAN)),
        ("negative countdown", Box::new(|c: &mut Config| c.session.countdown_seconds = -1.0)),
    ];

    for (name, mutate) in cases {
        let mut config = Config::default();
        mutate(&mut config);
        assert!(
            matches!(config.validate(), Err(AppError::ConfigError(_))),
            "Expected {name} to be rejected"
        );
    }
}
