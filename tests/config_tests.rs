//! Tests for loading the server configuration from disk
//!
//! These tests verify that:
//! - YAML files are read and defaulted correctly
//! - Missing or invalid files produce errors
//! - The token table and list settings reach the running server

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use binset::prelude::*;
use serde_json::{Value, json};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(yaml.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_load_config_from_file() {
    let file = write_config(
        r#"
bind: "0.0.0.0:8100"
list:
  page_size: 5
  ordering_fields: [id]
tokens:
  t-1: owner-a
"#,
    );

    let config = tokio_test::assert_ok!(ServerConfig::from_yaml_file(
        file.path().to_str().unwrap()
    ));

    assert_eq!(config.bind, "0.0.0.0:8100");
    assert_eq!(config.list.page_size, 5);
    assert_eq!(config.list.ordering_fields, vec!["id".to_string()]);
    assert!(config.list.is_filterable("bin_size"));
    assert_eq!(config.tokens.len(), 1);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");

    let err = tokio_test::assert_err!(ServerConfig::from_yaml_file(path.to_str().unwrap()));
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn test_invalid_yaml_is_an_error() {
    let file = write_config("list: [not, a, map]\n");
    tokio_test::assert_err!(ServerConfig::from_yaml_file(file.path().to_str().unwrap()));
}

#[tokio::test]
async fn test_config_tokens_drive_default_auth() {
    let file = write_config(
        r#"
list:
  page_size: 1
tokens:
  t-1: owner-a
"#,
    );
    let config = ServerConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();

    let catalog = InMemoryCatalog::new();
    catalog.add_bin_size("owner-a", "S1").unwrap();
    catalog.add_bin_property(SYSTEM_OWNER, "Normal").unwrap();

    let app = ServerBuilder::new()
        .with_config(config)
        .with_binset_store(InMemoryBinsetStore::new())
        .with_catalog(catalog)
        .build()
        .expect("Failed to build app");
    let server = TestServer::new(app);

    for name in ["a", "b"] {
        server
            .post("/binset/")
            .add_header(HeaderName::from_static("token"), HeaderValue::from_static("t-1"))
            .json(&json!({"bin_name": name, "bin_size": "S1", "bin_property": "Normal"}))
            .await
            .assert_status_ok();
    }

    let body: Value = server
        .get("/binset/")
        .add_header(HeaderName::from_static("token"), HeaderValue::from_static("t-1"))
        .await
        .json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["next"], 2);

    // Unknown tokens act as no identity at all
    let body: Value = server
        .get("/binset/")
        .add_header(HeaderName::from_static("token"), HeaderValue::from_static("nope"))
        .await
        .json();
    assert_eq!(body["count"], 0);
}
