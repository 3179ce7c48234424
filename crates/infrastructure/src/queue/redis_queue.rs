use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use taskboard_domain::{NotificationQueue, QueuedMessage};
use taskboard_errors::{StorageError, StorageResult};

/// 队列中保存的消息信封
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    id: String,
    body: String,
    /// 此前已投递的次数
    dequeue_count: u32,
}

/// 队列使用的 Redis 键
#[derive(Debug, Clone)]
struct QueueKeys {
    marker: String,
    pending: String,
    processing: String,
    deadlines: String,
}

impl QueueKeys {
    fn new(queue_name: &str) -> Self {
        Self {
            marker: format!("taskboard:queue:{queue_name}:exists"),
            pending: format!("taskboard:queue:{queue_name}:pending"),
            processing: format!("taskboard:queue:{queue_name}:processing"),
            deadlines: format!("taskboard:queue:{queue_name}:deadlines"),
        }
    }
}

/// 基于 Redis 列表的通知队列实现
///
/// 发送时 `LPUSH` 到 pending 列表；接收时 `LMOVE` 到 processing 列表，并在有序集合中
/// 记录可见性截止时间；确认时从 processing 中 `LREM`。每次接收前先把已过截止时间的
/// 消息放回 pending，实现超时重投。pop receipt 即 processing 列表中的原始信封。
pub struct RedisNotificationQueue {
    conn: ConnectionManager,
    keys: QueueKeys,
    visibility_timeout: Duration,
}

fn queue_err(operation: &'static str) -> impl Fn(redis::RedisError) -> StorageError {
    move |e| StorageError::queue(operation, e)
}

impl RedisNotificationQueue {
    pub async fn connect(
        url: &str,
        queue_name: &str,
        visibility_timeout: Duration,
    ) -> StorageResult<Self> {
        info!("Creating Redis notification queue '{}' at {}", queue_name, url);

        let client = Client::open(url).map_err(queue_err("connect"))?;
        let mut conn = client
            .get_connection_manager()
            .await
            .map_err(queue_err("connect"))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(queue_err("connect"))?;

        Ok(Self {
            conn,
            keys: QueueKeys::new(queue_name),
            visibility_timeout,
        })
    }

    /// 把可见性已过期的消息放回 pending 列表
    async fn reclaim_expired(&self, conn: &mut ConnectionManager) -> StorageResult<()> {
        let now_ms = Utc::now().timestamp_millis();
        let expired: Vec<String> = redis::cmd("ZRANGEBYSCORE")
            .arg(&self.keys.deadlines)
            .arg("-inf")
            .arg(now_ms)
            .query_async(conn)
            .await
            .map_err(queue_err("receive_one"))?;

        for raw in expired {
            let removed: i64 = redis::cmd("LREM")
                .arg(&self.keys.processing)
                .arg(1)
                .arg(&raw)
                .query_async(conn)
                .await
                .map_err(queue_err("receive_one"))?;
            let _: i64 = redis::cmd("ZREM")
                .arg(&self.keys.deadlines)
                .arg(&raw)
                .query_async(conn)
                .await
                .map_err(queue_err("receive_one"))?;

            if removed == 0 {
                continue;
            }
            match serde_json::from_str::<Envelope>(&raw) {
                Ok(mut envelope) => {
                    envelope.dequeue_count += 1;
                    let requeued = serde_json::to_string(&envelope)?;
                    // pending 从右端弹出，放回右端使其下一个被接收
                    let _: i64 = redis::cmd("RPUSH")
                        .arg(&self.keys.pending)
                        .arg(requeued)
                        .query_async(conn)
                        .await
                        .map_err(queue_err("receive_one"))?;
                    debug!(message_id = %envelope.id, "消息可见性超时，重新投递");
                }
                Err(e) => warn!("丢弃无法解析的消息信封: {}", e),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationQueue for RedisNotificationQueue {
    async fn ensure_queue_exists(&self) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(&self.keys.marker)
            .arg(1)
            .query_async(&mut conn)
            .await
            .map_err(queue_err("ensure_queue_exists"))?;
        Ok(())
    }

    #[instrument(skip(self, payload))]
    async fn send(&self, payload: &str) -> StorageResult<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = redis::cmd("EXISTS")
            .arg(&self.keys.marker)
            .query_async(&mut conn)
            .await
            .map_err(queue_err("send"))?;
        if !exists {
            debug!("Redis 队列尚未创建，跳过发送");
            return Ok(false);
        }

        let envelope = Envelope {
            id: Uuid::new_v4().to_string(),
            body: payload.to_string(),
            dequeue_count: 0,
        };
        let _: i64 = redis::cmd("LPUSH")
            .arg(&self.keys.pending)
            .arg(serde_json::to_string(&envelope)?)
            .query_async(&mut conn)
            .await
            .map_err(queue_err("send"))?;
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn receive_one(&self) -> StorageResult<Option<QueuedMessage>> {
        let mut conn = self.conn.clone();
        self.reclaim_expired(&mut conn).await?;

        let raw: Option<String> = redis::cmd("LMOVE")
            .arg(&self.keys.pending)
            .arg(&self.keys.processing)
            .arg("RIGHT")
            .arg("LEFT")
            .query_async(&mut conn)
            .await
            .map_err(queue_err("receive_one"))?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let deadline_ms =
            Utc::now().timestamp_millis() + self.visibility_timeout.as_millis() as i64;
        let _: i64 = redis::cmd("ZADD")
            .arg(&self.keys.deadlines)
            .arg(deadline_ms)
            .arg(&raw)
            .query_async(&mut conn)
            .await
            .map_err(queue_err("receive_one"))?;

        let envelope: Envelope = serde_json::from_str(&raw)?;
        Ok(Some(QueuedMessage {
            message_id: envelope.id,
            pop_receipt: raw,
            body: envelope.body,
            dequeue_count: envelope.dequeue_count + 1,
        }))
    }

    #[instrument(skip(self, message), fields(message_id = %message.message_id))]
    async fn acknowledge(&self, message: &QueuedMessage) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        let (removed, _): (i64, i64) = redis::pipe()
            .atomic()
            .cmd("LREM")
            .arg(&self.keys.processing)
            .arg(1)
            .arg(&message.pop_receipt)
            .cmd("ZREM")
            .arg(&self.keys.deadlines)
            .arg(&message.pop_receipt)
            .query_async(&mut conn)
            .await
            .map_err(queue_err("acknowledge"))?;

        if removed == 0 {
            return Err(StorageError::queue(
                "acknowledge",
                format!("消息 {} 不存在或 pop receipt 已失效", message.message_id),
            ));
        }
        Ok(())
    }
}
