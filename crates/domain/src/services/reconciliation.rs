//! 读路径合并
//!
//! 把表存储记录、实时签发的附件 URL 和队列中的待处理通知拼成一个视图。

use std::time::Duration;

use taskboard_errors::TaskResult;
use tracing::{debug, warn};

use crate::entities::{TaskDetails, TaskEntity, TaskNotification};
use crate::ports::{BlobStore, NotificationQueue};

use super::classification::{attachment_failure, notification_failure};

/// 为附件名签发 URL，不检查对象是否存在
pub(crate) fn derive_file_url(
    blobs: &dyn BlobStore,
    file_name: &str,
    ttl: Duration,
) -> TaskResult<String> {
    blobs
        .signed_read_url(file_name, ttl)
        .map_err(|e| attachment_failure(file_name, e))
}

/// 列表场景下签发 URL，单条记录签发失败只记录告警并返回 `None`
pub(crate) fn listed_file_url(
    blobs: &dyn BlobStore,
    file_name: &str,
    ttl: Duration,
) -> Option<String> {
    match blobs.signed_read_url(file_name, ttl) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(file_name, error = %e, "附件 URL 签发失败，该条目不返回 URL");
            None
        }
    }
}

pub(crate) fn merge(record: TaskEntity, file_url: Option<String>) -> TaskDetails {
    TaskDetails { record, file_url }
}

/// 尝试取出一条待处理通知并立即确认
///
/// 接收失败视为没有消息。确认失败只记录日志，消息仍然返回，之后可能被重复投递。
pub(crate) async fn drain_notification(queue: &dyn NotificationQueue) -> Option<TaskNotification> {
    let message = match queue.receive_one().await {
        Ok(Some(message)) => message,
        Ok(None) => {
            debug!("队列中没有待处理的通知");
            return None;
        }
        Err(e) => {
            notification_failure("receive", e);
            return None;
        }
    };

    if let Err(e) = queue.acknowledge(&message).await {
        notification_failure("acknowledge", e);
    }

    let notification = serde_json::from_str::<TaskNotification>(&message.body).unwrap_or_else(|_| {
        warn!(message_id = %message.message_id, "通知内容不是预期格式，按原文返回");
        TaskNotification::new(message.body.clone())
    });
    Some(notification)
}
