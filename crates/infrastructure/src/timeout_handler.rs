//! 叶子存储调用的超时处理
//!
//! 三种存储客户端各自包一层超时装饰器，超时后返回 [`StorageError::Timeout`]，
//! 由上层按普通后端失败处理。

use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::error;

use taskboard_domain::{BlobStore, NotificationQueue, QueuedMessage, RecordStore, TaskEntity};
use taskboard_errors::{Backend, StorageError, StorageResult};

/// 在给定时间内执行操作，超时则返回超时错误
pub async fn execute_with_timeout<F, T>(
    backend: Backend,
    operation: &'static str,
    timeout_duration: Duration,
    future: F,
) -> StorageResult<T>
where
    F: Future<Output = StorageResult<T>>,
{
    match timeout(timeout_duration, future).await {
        Ok(result) => result,
        Err(_) => {
            error!(
                "{}操作 '{}' 超时 (超时时间: {:?})",
                backend, operation, timeout_duration
            );
            Err(StorageError::Timeout {
                backend,
                operation,
                timeout: timeout_duration,
            })
        }
    }
}

/// 带超时的表存储
pub struct TimedRecordStore {
    inner: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl TimedRecordStore {
    pub fn new(inner: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn run<F, T>(&self, operation: &'static str, future: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        execute_with_timeout(Backend::RecordStore, operation, self.timeout, future).await
    }
}

#[async_trait]
impl RecordStore for TimedRecordStore {
    async fn ensure_table_exists(&self) -> StorageResult<()> {
        self.run("ensure_table_exists", self.inner.ensure_table_exists())
            .await
    }

    async fn upsert_replace(&self, entity: &TaskEntity) -> StorageResult<TaskEntity> {
        self.run("upsert_replace", self.inner.upsert_replace(entity))
            .await
    }

    async fn get(&self, partition_key: &str, row_key: &str) -> StorageResult<Option<TaskEntity>> {
        self.run("get", self.inner.get(partition_key, row_key)).await
    }

    async fn scan_all(&self) -> StorageResult<Vec<TaskEntity>> {
        self.run("scan_all", self.inner.scan_all()).await
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> StorageResult<bool> {
        self.run("delete", self.inner.delete(partition_key, row_key))
            .await
    }
}

/// 带超时的 Blob 存储，签名 URL 为本地计算，不计时
pub struct TimedBlobStore {
    inner: Arc<dyn BlobStore>,
    timeout: Duration,
}

impl TimedBlobStore {
    pub fn new(inner: Arc<dyn BlobStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn run<F, T>(&self, operation: &'static str, future: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        execute_with_timeout(Backend::BlobStore, operation, self.timeout, future).await
    }
}

#[async_trait]
impl BlobStore for TimedBlobStore {
    async fn ensure_container_exists(&self) -> StorageResult<()> {
        self.run("ensure_container_exists", self.inner.ensure_container_exists())
            .await
    }

    async fn upload(&self, name: &str, content: Bytes, content_type: &str) -> StorageResult<()> {
        self.run("upload", self.inner.upload(name, content, content_type))
            .await
    }

    fn signed_read_url(&self, name: &str, ttl: Duration) -> StorageResult<String> {
        self.inner.signed_read_url(name, ttl)
    }

    async fn delete(&self, name: &str, include_all_versions: bool) -> StorageResult<bool> {
        self.run("delete", self.inner.delete(name, include_all_versions))
            .await
    }

    async fn list_names(&self) -> StorageResult<Vec<String>> {
        self.run("list_names", self.inner.list_names()).await
    }
}

/// 带超时的通知队列
pub struct TimedNotificationQueue {
    inner: Arc<dyn NotificationQueue>,
    timeout: Duration,
}

impl TimedNotificationQueue {
    pub fn new(inner: Arc<dyn NotificationQueue>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn run<F, T>(&self, operation: &'static str, future: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        execute_with_timeout(Backend::Queue, operation, self.timeout, future).await
    }
}

#[async_trait]
impl NotificationQueue for TimedNotificationQueue {
    async fn ensure_queue_exists(&self) -> StorageResult<()> {
        self.run("ensure_queue_exists", self.inner.ensure_queue_exists())
            .await
    }

    async fn send(&self, payload: &str) -> StorageResult<bool> {
        self.run("send", self.inner.send(payload)).await
    }

    async fn receive_one(&self) -> StorageResult<Option<QueuedMessage>> {
        self.run("receive_one", self.inner.receive_one()).await
    }

    async fn acknowledge(&self, message: &QueuedMessage) -> StorageResult<()> {
        self.run("acknowledge", self.inner.acknowledge(message))
            .await
    }
}
