use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use taskboard_domain::{NotificationQueue, QueuedMessage};
use taskboard_errors::{StorageError, StorageResult};

#[derive(Debug)]
struct Entry {
    message_id: String,
    body: String,
    dequeue_count: u32,
    pop_receipt: Option<String>,
    invisible_until: Option<Instant>,
}

impl Entry {
    fn is_visible(&self, now: Instant) -> bool {
        self.invisible_until.map_or(true, |until| until <= now)
    }
}

#[derive(Debug, Default)]
struct QueueState {
    exists: bool,
    entries: VecDeque<Entry>,
}

/// 内存通知队列实现
///
/// 至少一次投递：接收的消息在可见性超时内对其他接收者不可见，超时未确认则重新投递，
/// 且 `dequeue_count` 递增。确认时必须携带最近一次接收得到的 pop receipt。
#[derive(Debug, Clone)]
pub struct InMemoryNotificationQueue {
    state: Arc<Mutex<QueueState>>,
    visibility_timeout: Duration,
}

impl InMemoryNotificationQueue {
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            visibility_timeout,
        }
    }

    /// 队列中尚未确认的消息数（含不可见的消息）
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.entries.is_empty()
    }
}

#[async_trait]
impl NotificationQueue for InMemoryNotificationQueue {
    async fn ensure_queue_exists(&self) -> StorageResult<()> {
        self.state.lock().await.exists = true;
        Ok(())
    }

    async fn send(&self, payload: &str) -> StorageResult<bool> {
        let mut state = self.state.lock().await;
        if !state.exists {
            debug!("内存队列尚未创建，跳过发送");
            return Ok(false);
        }
        state.entries.push_back(Entry {
            message_id: Uuid::new_v4().to_string(),
            body: payload.to_string(),
            dequeue_count: 0,
            pop_receipt: None,
            invisible_until: None,
        });
        Ok(true)
    }

    async fn receive_one(&self) -> StorageResult<Option<QueuedMessage>> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        let Some(entry) = state.entries.iter_mut().find(|entry| entry.is_visible(now)) else {
            return Ok(None);
        };

        let pop_receipt = Uuid::new_v4().to_string();
        entry.dequeue_count += 1;
        entry.pop_receipt = Some(pop_receipt.clone());
        entry.invisible_until = Some(now + self.visibility_timeout);

        Ok(Some(QueuedMessage {
            message_id: entry.message_id.clone(),
            pop_receipt,
            body: entry.body.clone(),
            dequeue_count: entry.dequeue_count,
        }))
    }

    async fn acknowledge(&self, message: &QueuedMessage) -> StorageResult<()> {
        let mut state = self.state.lock().await;
        let position = state.entries.iter().position(|entry| {
            entry.message_id == message.message_id
                && entry.pop_receipt.as_deref() == Some(message.pop_receipt.as_str())
        });
        match position {
            Some(index) => {
                state.entries.remove(index);
                Ok(())
            }
            None => Err(StorageError::queue(
                "acknowledge",
                format!("消息 {} 不存在或 pop receipt 已失效", message.message_id),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn queue(visibility: Duration) -> InMemoryNotificationQueue {
        let queue = InMemoryNotificationQueue::new(visibility);
        queue.ensure_queue_exists().await.unwrap();
        queue
    }

    #[tokio::test]
    async fn test_send_skipped_until_queue_exists() {
        let queue = InMemoryNotificationQueue::new(Duration::from_secs(30));
        assert!(!queue.send("hello").await.unwrap());
        assert!(queue.is_empty().await);

        queue.ensure_queue_exists().await.unwrap();
        assert!(queue.send("hello").await.unwrap());
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_receive_then_acknowledge() {
        let queue = queue(Duration::from_secs(30)).await;
        queue.send("first").await.unwrap();
        queue.send("second").await.unwrap();

        let message = queue.receive_one().await.unwrap().unwrap();
        assert_eq!(message.body, "first");
        assert_eq!(message.dequeue_count, 1);

        // 未确认的消息在可见性超时内不可见
        let next = queue.receive_one().await.unwrap().unwrap();
        assert_eq!(next.body, "second");
        assert!(queue.receive_one().await.unwrap().is_none());

        queue.acknowledge(&message).await.unwrap();
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_empty_queue_returns_none() {
        let queue = queue(Duration::from_secs(30)).await;
        assert!(queue.receive_one().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unacknowledged_message_is_redelivered() {
        let queue = queue(Duration::from_secs(30)).await;
        queue.send("retry me").await.unwrap();

        let first = queue.receive_one().await.unwrap().unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        let second = queue.receive_one().await.unwrap().unwrap();

        assert_eq!(first.message_id, second.message_id);
        assert_eq!(second.dequeue_count, 2);

        // 旧的 pop receipt 已失效
        assert!(queue.acknowledge(&first).await.is_err());
        queue.acknowledge(&second).await.unwrap();
        assert!(queue.is_empty().await);
    }
}
