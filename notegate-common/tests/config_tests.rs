//! Tests for TOML loading and default path resolution

use notegate_common::config::{default_config_path, default_database_path, load_toml};
use notegate_common::Error;
use serde::Deserialize;
use std::io::Write;

#[derive(Debug, Deserialize)]
struct SampleConfig {
    port: u16,
    #[serde(default)]
    name: String,
}

#[test]
fn test_load_toml_reads_typed_struct() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "port = 5750").unwrap();
    writeln!(file, "name = \"capture\"").unwrap();

    let config: SampleConfig = load_toml(&path).unwrap();
    assert_eq!(config.port, 5750);
    assert_eq!(config.name, "capture");
}

#[test]
fn test_load_toml_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let result: Result<SampleConfig, _> = load_toml(&path);
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_load_toml_reports_parse_errors_as_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    let result: Result<SampleConfig, _> = load_toml(&path);
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("broken.toml")),
        other => panic!("expected Config error, got {:?}", other.err()),
    }
}

#[test]
fn test_default_paths_are_namespaced() {
    assert!(default_config_path().to_string_lossy().contains("notegate"));
    assert!(default_database_path().to_string_lossy().contains("notegate"));
}
