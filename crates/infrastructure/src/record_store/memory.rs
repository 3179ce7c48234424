use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use taskboard_domain::{RecordStore, TaskEntity};
use taskboard_errors::StorageResult;

use super::weak_etag;

type RecordKey = (String, String);

/// 内存表存储实现
///
/// 进程内的有序映射，重启后数据丢失，适用于本地开发和测试。
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<BTreeMap<RecordKey, TaskEntity>>>,
    version: Arc<AtomicU64>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn ensure_table_exists(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn upsert_replace(&self, entity: &TaskEntity) -> StorageResult<TaskEntity> {
        let now = Utc::now();
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;

        let mut stored = entity.clone();
        stored.timestamp = Some(now);
        stored.etag = Some(weak_etag(now, version));

        let key = (stored.partition_key.clone(), stored.row_key.clone());
        let replaced = self.records.write().await.insert(key, stored.clone());
        debug!(
            partition_key = %stored.partition_key,
            row_key = %stored.row_key,
            replaced = replaced.is_some(),
            "内存表存储写入记录"
        );
        Ok(stored)
    }

    async fn get(&self, partition_key: &str, row_key: &str) -> StorageResult<Option<TaskEntity>> {
        let key = (partition_key.to_string(), row_key.to_string());
        Ok(self.records.read().await.get(&key).cloned())
    }

    async fn scan_all(&self) -> StorageResult<Vec<TaskEntity>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> StorageResult<bool> {
        let key = (partition_key.to_string(), row_key.to_string());
        Ok(self.records.write().await.remove(&key).is_some())
    }
}
