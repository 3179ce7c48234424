use std::sync::Arc;
use tracing::{debug, info};

use taskboard_config::{
    AppConfig, BlobStoreConfig, BlobStoreType, QueueConfig, QueueType, RecordStoreConfig,
    RecordStoreType, TimeoutConfig,
};
use taskboard_domain::{BlobStore, NotificationQueue, RecordStore};
use taskboard_errors::StorageResult;

use crate::blob_store::{InMemoryBlobStore, LocalFsBlobStore, UrlSigner};
use crate::queue::{InMemoryNotificationQueue, RedisNotificationQueue};
use crate::record_store::{InMemoryRecordStore, SqliteRecordStore};
use crate::timeout_handler::{TimedBlobStore, TimedNotificationQueue, TimedRecordStore};

/// 按配置创建好的三个存储客户端，均已带超时包装
#[derive(Clone)]
pub struct StorageClients {
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub notifications: Arc<dyn NotificationQueue>,
}

impl StorageClients {
    /// 启动时创建表、容器和队列
    pub async fn ensure_all_exist(&self) -> StorageResult<()> {
        self.records.ensure_table_exists().await?;
        self.blobs.ensure_container_exists().await?;
        self.notifications.ensure_queue_exists().await?;
        info!("All storage resources are ready");
        Ok(())
    }
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &AppConfig) -> StorageResult<StorageClients> {
        let records = Self::create_record_store(&config.record_store).await?;
        let blobs = Self::create_blob_store(&config.blob_store)?;
        let notifications = Self::create_notification_queue(&config.queue).await?;
        Ok(Self::with_timeouts(
            records,
            blobs,
            notifications,
            &config.timeouts,
        ))
    }

    pub async fn create_record_store(
        config: &RecordStoreConfig,
    ) -> StorageResult<Arc<dyn RecordStore>> {
        debug!("Creating record store with type: {:?}", config.r#type);
        match config.r#type {
            RecordStoreType::InMemory => Ok(Arc::new(InMemoryRecordStore::new())),
            RecordStoreType::Sqlite => {
                let store = SqliteRecordStore::connect(
                    &config.url,
                    &config.table_name,
                    config.max_connections,
                )
                .await?;
                Ok(Arc::new(store))
            }
        }
    }

    pub fn create_blob_store(config: &BlobStoreConfig) -> StorageResult<Arc<dyn BlobStore>> {
        debug!("Creating blob store with type: {:?}", config.r#type);
        let signer = UrlSigner::new(
            &config.public_base_url,
            &config.container_name,
            config.signing_key.as_bytes(),
        )?;
        match config.r#type {
            BlobStoreType::InMemory => Ok(Arc::new(InMemoryBlobStore::new(signer))),
            BlobStoreType::LocalFs => Ok(Arc::new(LocalFsBlobStore::new(&config.root_dir, signer))),
        }
    }

    pub async fn create_notification_queue(
        config: &QueueConfig,
    ) -> StorageResult<Arc<dyn NotificationQueue>> {
        debug!("Creating notification queue with type: {:?}", config.r#type);
        let visibility_timeout = std::time::Duration::from_secs(config.visibility_timeout_seconds);
        match config.r#type {
            QueueType::InMemory => Ok(Arc::new(InMemoryNotificationQueue::new(visibility_timeout))),
            QueueType::Redis => {
                let queue =
                    RedisNotificationQueue::connect(&config.url, &config.queue_name, visibility_timeout)
                        .await?;
                Ok(Arc::new(queue))
            }
        }
    }

    pub fn with_timeouts(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        notifications: Arc<dyn NotificationQueue>,
        timeouts: &TimeoutConfig,
    ) -> StorageClients {
        StorageClients {
            records: Arc::new(TimedRecordStore::new(records, timeouts.record_store())),
            blobs: Arc::new(TimedBlobStore::new(blobs, timeouts.blob_store())),
            notifications: Arc::new(TimedNotificationQueue::new(notifications, timeouts.queue())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use taskboard_testing_utils::TaskEntityBuilder;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_in_memory_clients() {
        let clients = StorageFactory::create(&AppConfig::in_memory()).await.unwrap();
        clients.ensure_all_exist().await.unwrap();

        let entity = TaskEntityBuilder::new().build();
        clients.records.upsert_replace(&entity).await.unwrap();
        assert_eq!(clients.records.scan_all().await.unwrap().len(), 1);
        assert!(clients.notifications.send("hello").await.unwrap());

        let url = clients
            .blobs
            .signed_read_url("a.txt", Duration::from_secs(60))
            .unwrap();
        assert!(url.starts_with("http://localhost:8080/blobs/task-files/a.txt?"));
    }

    #[tokio::test]
    async fn test_create_sqlite_and_local_fs_clients() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = AppConfig::in_memory();
        config.record_store.r#type = RecordStoreType::Sqlite;
        config.record_store.url =
            format!("sqlite://{}", temp_dir.path().join("tasks.db").display());
        config.blob_store.r#type = BlobStoreType::LocalFs;
        config.blob_store.root_dir = temp_dir.path().join("blobs").display().to_string();

        let clients = StorageFactory::create(&config).await.unwrap();
        clients.ensure_all_exist().await.unwrap();

        assert!(temp_dir.path().join("blobs").join("task-files").is_dir());
        assert!(clients.records.scan_all().await.unwrap().is_empty());
        assert!(clients.blobs.list_names().await.unwrap().is_empty());
    }

    #[test]
    fn test_blob_store_rejects_bad_base_url() {
        let mut config = AppConfig::in_memory().blob_store;
        config.public_base_url = "not a url".to_string();
        assert!(StorageFactory::create_blob_store(&config).is_err());
    }
}
