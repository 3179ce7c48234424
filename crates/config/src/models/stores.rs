use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStoreType {
    InMemory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordStoreConfig {
    pub r#type: RecordStoreType,
    pub url: String,
    pub table_name: String,
    pub max_connections: u32,
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            r#type: RecordStoreType::Sqlite,
            url: "sqlite://data/taskboard.db".to_string(),
            table_name: "Tasks".to_string(),
            max_connections: 5,
        }
    }
}

impl RecordStoreConfig {
    pub fn in_memory_default() -> Self {
        Self {
            r#type: RecordStoreType::InMemory,
            url: "".to_string(), // 内存存储不需要URL
            ..Self::default()
        }
    }
}

impl ConfigValidator for RecordStoreConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_table_name(&self.table_name, "record_store.table_name")?;

        match self.r#type {
            RecordStoreType::Sqlite => {
                ValidationUtils::validate_not_empty(&self.url, "record_store.url")?;
                if !self.url.starts_with("sqlite:") {
                    return Err(crate::ConfigError::Validation(
                        "record_store.url must start with sqlite:".to_string(),
                    ));
                }
                ValidationUtils::validate_count(
                    self.max_connections as usize,
                    "record_store.max_connections",
                )?;
            }
            RecordStoreType::InMemory => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlobStoreType {
    InMemory,
    LocalFs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    pub r#type: BlobStoreType,
    pub root_dir: String,
    pub container_name: String,
    pub public_base_url: String,
    pub signing_key: String,
    pub url_ttl_seconds: u64,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            r#type: BlobStoreType::LocalFs,
            root_dir: "data/blobs".to_string(),
            container_name: "task-files".to_string(),
            public_base_url: "http://localhost:8080/blobs".to_string(),
            signing_key: "change-this-signing-key-in-production".to_string(),
            url_ttl_seconds: 60,
        }
    }
}

impl BlobStoreConfig {
    pub fn in_memory_default() -> Self {
        Self {
            r#type: BlobStoreType::InMemory,
            ..Self::default()
        }
    }
}

impl ConfigValidator for BlobStoreConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        if self.r#type == BlobStoreType::LocalFs {
            ValidationUtils::validate_not_empty(&self.root_dir, "blob_store.root_dir")?;
        }
        ValidationUtils::validate_resource_name(&self.container_name, "blob_store.container_name")?;
        ValidationUtils::validate_url(
            &self.public_base_url,
            &["http", "https"],
            "blob_store.public_base_url",
        )?;
        ValidationUtils::validate_not_empty(&self.signing_key, "blob_store.signing_key")?;
        if self.signing_key.len() < 16 {
            return Err(crate::ConfigError::Validation(
                "blob_store.signing_key must be at least 16 characters long".to_string(),
            ));
        }
        ValidationUtils::validate_timeout_seconds(self.url_ttl_seconds, "blob_store.url_ttl_seconds")?;
        Ok(())
    }
}
