//! Configuration loading from files and the environment.

use mediaforge::config::{self, ENV_OUTPUT_DIR, ENV_UPLOAD_DIR};
use serial_test::serial;
use std::path::PathBuf;
use tempfile::tempdir;

const SAMPLE: &str = r#"
[storage]
upload_dir = "/srv/mediaforge/uploads"
output_dir = "/srv/mediaforge/outputs"

[jobs]
relay_capacity = 32
max_job_age_secs = 600
remove_input_on_success = false
"#;

fn clear_env() {
    std::env::remove_var(ENV_UPLOAD_DIR);
    std::env::remove_var(ENV_OUTPUT_DIR);
}

#[test]
#[serial]
fn load_from_file() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("mediaforge.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    let config = config::load_config(&path).unwrap();
    assert_eq!(config.storage.upload_dir, PathBuf::from("/srv/mediaforge/uploads"));
    assert_eq!(config.jobs.relay_capacity, 32);
    assert_eq!(config.jobs.max_job_age().as_secs(), 600);
    assert!(!config.jobs.remove_input_on_success);
    assert_eq!(config.jobs.diagnostic_tail_lines, 200);
}

#[test]
#[serial]
fn environment_overrides_file() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("mediaforge.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    std::env::set_var(ENV_OUTPUT_DIR, "/data/converted");
    let config = config::load_config(&path);
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.storage.output_dir, PathBuf::from("/data/converted"));
    assert_eq!(config.storage.upload_dir, PathBuf::from("/srv/mediaforge/uploads"));
}

#[test]
#[serial]
fn invalid_values_are_rejected() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[jobs]\nrelay_capacity = 0\n").unwrap();

    let err = config::load_config(&path).unwrap_err();
    assert!(err.to_string().contains("relay_capacity"));
}

#[test]
#[serial]
fn missing_file_is_an_error() {
    let err = config::load_config(std::path::Path::new("/nonexistent/mediaforge.toml"))
        .unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
