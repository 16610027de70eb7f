//! Integration tests for configuration loading
//!
//! Each test writes its YAML into a fresh `tempfile::TempDir`.

use ordhub::config::{ConfigError, HubConfig};
use ordhub::server::AppBuilder;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, yaml: &str) -> String {
    let path = dir.path().join("ordhub.yaml");
    fs::write(&path, yaml).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_load_full_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
records:
  base_url: https://db.example.org/orders
  api_key: db-key
objects:
  base_url: https://files.example.org/bucket/
  api_key: s3-key
listen: 0.0.0.0:8080
"#,
    );

    let config = HubConfig::from_yaml_file(&path).unwrap();

    assert_eq!(config.records.base(), "https://db.example.org/orders");
    assert_eq!(config.records.api_key, "db-key");
    assert_eq!(config.objects.base(), "https://files.example.org/bucket");
    assert_eq!(config.listen, "0.0.0.0:8080");
}

#[test]
fn test_listen_defaults_to_localhost() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
records: { base_url: "http://localhost:4000/orders", api_key: a }
objects: { base_url: "http://localhost:4001", api_key: b }
"#,
    );

    let config = HubConfig::from_yaml_file(&path).unwrap();

    assert_eq!(config.listen, "127.0.0.1:3000");
}

#[test]
fn test_missing_section_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
records: { base_url: "http://localhost:4000/orders", api_key: a }
"#,
    );

    let err = HubConfig::from_yaml_file(&path).unwrap_err();

    assert!(err.to_string().contains("objects"));
}

#[test]
fn test_bad_url_is_typed_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
records: { base_url: "http://localhost:4000/orders", api_key: a }
objects: { base_url: "files bucket", api_key: b }
"#,
    );

    let err = HubConfig::from_yaml_file(&path).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidUrl { .. })
    ));
}

#[test]
fn test_nonexistent_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.yaml");

    assert!(HubConfig::from_yaml_file(&path.to_string_lossy()).is_err());
}

#[tokio::test]
async fn test_loaded_config_builds_app() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
records: { base_url: "http://127.0.0.1:9/orders", api_key: db }
objects: { base_url: "http://127.0.0.1:9/objects", api_key: s3 }
"#,
    );
    let config = HubConfig::from_yaml_file(&path).unwrap();

    assert!(AppBuilder::from_config(&config).unwrap().build().is_ok());
}
