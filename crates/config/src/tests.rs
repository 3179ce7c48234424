use crate::{AppConfig, BlobStoreType, QueueType, RecordStoreType};

use std::fs;
use tempfile::TempDir;

fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("taskboard.toml");
    fs::write(
        &path,
        r#"
[record_store]
type = "InMemory"

[blob_store]
type = "InMemory"
container_name = "attachments"

[queue]
type = "InMemory"
"#,
    )
    .unwrap();

    let config = AppConfig::load_with_env(path.to_str(), env(&[])).unwrap();

    assert_eq!(config.record_store.r#type, RecordStoreType::InMemory);
    assert_eq!(config.blob_store.r#type, BlobStoreType::InMemory);
    assert_eq!(config.blob_store.container_name, "attachments");
    assert_eq!(config.queue.r#type, QueueType::InMemory);
    // 文件中未出现的字段取默认值
    assert_eq!(config.record_store.table_name, "Tasks");
    assert_eq!(config.blob_store.url_ttl_seconds, 60);
}

#[test]
fn test_environment_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("taskboard.toml");
    fs::write(
        &path,
        r#"
[record_store]
type = "InMemory"
table_name = "FromFile"
"#,
    )
    .unwrap();

    let config = AppConfig::load_with_env(
        path.to_str(),
        env(&[
            ("TASKBOARD_RECORD_STORE__TABLE_NAME", "FromEnv"),
            ("TASKBOARD_TIMEOUTS__QUEUE_SECONDS", "7"),
            ("TASKBOARD_QUEUE__TYPE", "InMemory"),
            ("UNRELATED_VARIABLE", "ignored"),
        ]),
    )
    .unwrap();

    assert_eq!(config.record_store.table_name, "FromEnv");
    assert_eq!(config.timeouts.queue_seconds, 7);
    assert_eq!(config.queue.r#type, QueueType::InMemory);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let result = AppConfig::load_with_env(Some("/nonexistent/taskboard.toml"), env(&[]));
    assert!(result.is_err());
}

#[test]
fn test_invalid_override_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("taskboard.toml");
    fs::write(&path, "[queue]\ntype = \"InMemory\"\n").unwrap();

    let result = AppConfig::load_with_env(
        path.to_str(),
        env(&[("TASKBOARD_BLOB_STORE__CONTAINER_NAME", "Bad_Name")]),
    );
    assert!(result.is_err());
}
