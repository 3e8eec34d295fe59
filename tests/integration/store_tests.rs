//! Integration tests for the JSON calibration file on a real filesystem.

use std::fs;
use std::path::PathBuf;

use ecprobe::adapters::json_store::JsonFileStore;
use ecprobe::app::monitor::Monitor;
use ecprobe::app::ports::ConfigPort;
use ecprobe::config::{CalibrationConfig, SamplingConfig};
use ecprobe::error::ConfigError;

/// Fresh per-test directory under the system temp dir.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ecprobe-it-{}-{}", std::process::id(), name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn saved_calibration_is_what_the_monitor_loads() {
    let dir = scratch_dir("roundtrip");
    let mut store = JsonFileStore::new(dir.join("ec_config.json"));

    let mut config = CalibrationConfig::new(SamplingConfig::calibration(), 4.095_357, -225.142_9);
    config.raw_low = Some(400.0);
    config.raw_high = Some(3200.0);
    store.save(&config).unwrap();

    let monitor = Monitor::from_store(&store).unwrap();
    assert_eq!(monitor.config(), &config);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn file_is_human_readable_json() {
    let dir = scratch_dir("pretty");
    let path = dir.join("ec_config.json");
    let mut store = JsonFileStore::new(&path);

    store
        .save(&CalibrationConfig::new(SamplingConfig::default(), 4.0, -223.6))
        .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\n  \"slope\""));
    assert!(text.contains("\"intercept\""));
    assert!(!dir.join("ec_config.json.tmp").exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn recalibration_overwrites_previous_record() {
    let dir = scratch_dir("overwrite");
    let mut store = JsonFileStore::new(dir.join("ec_config.json"));

    store
        .save(&CalibrationConfig::new(SamplingConfig::default(), 4.0, -223.6))
        .unwrap();
    store
        .save(&CalibrationConfig::new(SamplingConfig::default(), 3.5, -100.0))
        .unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.slope, 3.5);
    assert_eq!(loaded.intercept, -100.0);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn invalid_record_is_never_written() {
    let dir = scratch_dir("invalid");
    let path = dir.join("ec_config.json");
    let mut store = JsonFileStore::new(&path);

    let bad = CalibrationConfig::new(SamplingConfig::default(), f32::NAN, 0.0);
    assert!(matches!(store.save(&bad), Err(ConfigError::Invalid(_))));
    assert!(!path.exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn absent_file_is_missing() {
    let dir = scratch_dir("absent");
    let store = JsonFileStore::new(dir.join("ec_config.json"));
    assert_eq!(store.load(), Err(ConfigError::Missing));
    fs::remove_dir_all(&dir).ok();
}
