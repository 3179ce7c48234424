use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use taskboard_domain::BlobStore;
use taskboard_errors::StorageResult;

use super::{snapshots_present, validate_blob_name, UrlSigner};

#[derive(Debug, Clone)]
struct StoredObject {
    content: Bytes,
    content_type: String,
    uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct BlobEntry {
    current: StoredObject,
    snapshots: Vec<StoredObject>,
}

/// 内存 Blob 存储实现
#[derive(Debug, Clone)]
pub struct InMemoryBlobStore {
    blobs: Arc<RwLock<BTreeMap<String, BlobEntry>>>,
    signer: UrlSigner,
}

impl InMemoryBlobStore {
    pub fn new(signer: UrlSigner) -> Self {
        Self {
            blobs: Arc::new(RwLock::new(BTreeMap::new())),
            signer,
        }
    }

    /// 读取当前版本的内容与类型
    pub async fn download(&self, name: &str) -> Option<(Bytes, String)> {
        self.blobs
            .read()
            .await
            .get(name)
            .map(|entry| (entry.current.content.clone(), entry.current.content_type.clone()))
    }

    pub async fn snapshot_count(&self, name: &str) -> usize {
        self.blobs
            .read()
            .await
            .get(name)
            .map(|entry| entry.snapshots.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn ensure_container_exists(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn upload(&self, name: &str, content: Bytes, content_type: &str) -> StorageResult<()> {
        validate_blob_name(name)?;
        let object = StoredObject {
            content,
            content_type: content_type.to_string(),
            uploaded_at: Utc::now(),
        };

        let mut blobs = self.blobs.write().await;
        match blobs.get_mut(name) {
            Some(entry) => {
                let previous = std::mem::replace(&mut entry.current, object);
                debug!(name, snapshot_of = %previous.uploaded_at, "覆盖对象，旧版本保留为快照");
                entry.snapshots.push(previous);
            }
            None => {
                blobs.insert(
                    name.to_string(),
                    BlobEntry {
                        current: object,
                        snapshots: Vec::new(),
                    },
                );
            }
        }
        Ok(())
    }

    fn signed_read_url(&self, name: &str, ttl: Duration) -> StorageResult<String> {
        self.signer.signed_read_url(name, ttl)
    }

    async fn delete(&self, name: &str, include_all_versions: bool) -> StorageResult<bool> {
        let mut blobs = self.blobs.write().await;
        let Some(entry) = blobs.get(name) else {
            return Ok(false);
        };
        if !include_all_versions && !entry.snapshots.is_empty() {
            return Err(snapshots_present(name, entry.snapshots.len()));
        }
        blobs.remove(name);
        Ok(true)
    }

    async fn list_names(&self) -> StorageResult<Vec<String>> {
        Ok(self.blobs.read().await.keys().cloned().collect())
    }
}
