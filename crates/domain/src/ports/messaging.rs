use async_trait::async_trait;
use taskboard_errors::StorageResult;

use crate::entities::QueuedMessage;

/// 至少一次投递的通知队列
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    async fn ensure_queue_exists(&self) -> StorageResult<()>;
    /// 队列不存在时静默跳过，返回 `false`
    async fn send(&self, payload: &str) -> StorageResult<bool>;
    /// 单次非阻塞接收，无可用消息时返回 `None`
    async fn receive_one(&self) -> StorageResult<Option<QueuedMessage>>;
    async fn acknowledge(&self, message: &QueuedMessage) -> StorageResult<()>;
}
