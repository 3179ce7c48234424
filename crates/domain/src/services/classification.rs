//! 叶子错误归类
//!
//! 每个叶子客户端错误都在这里转换为 [`TaskError`]，不允许未归类的错误越过编排层。

use taskboard_errors::{StorageError, TaskError};
use tracing::{error, warn};

pub(crate) fn record_store_failure(operation: &str, source: StorageError) -> TaskError {
    error!(operation, error = %source, "表存储调用失败");
    TaskError::RecordStore { source }
}

pub(crate) fn attachment_failure(file_name: &str, source: StorageError) -> TaskError {
    error!(file_name, error = %source, "附件处理失败");
    TaskError::Attachment {
        file_name: file_name.to_string(),
        source,
    }
}

/// 通知失败从不作为操作失败返回，只记录告警
pub(crate) fn notification_failure(operation: &str, source: StorageError) -> TaskError {
    warn!(operation, error = %source, "通知队列调用失败，已忽略");
    TaskError::Notification { source }
}
