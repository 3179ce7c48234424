use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 表存储中的任务记录
///
/// `partition_key` 由 `id` 派生，每个任务独占一个分区；`row_key` 是独立生成的第二个标识。
/// `timestamp` 与 `etag` 由表存储写入时填充，编排层不解释其内容。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntity {
    pub partition_key: String,
    pub row_key: String,
    pub id: Uuid,
    pub task_name: String,
    pub assignee: String,
    pub deadline: DateTime<Utc>,
    pub file_name: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub etag: Option<String>,
}

impl TaskEntity {
    /// 为新任务分配标识，在任何存储写入之前调用
    pub fn new(
        task_name: String,
        assignee: String,
        deadline: DateTime<Utc>,
        file_name: Option<String>,
    ) -> Self {
        let id = Uuid::new_v4();
        Self {
            partition_key: id.to_string(),
            row_key: Uuid::new_v4().to_string(),
            id,
            task_name,
            assignee,
            deadline,
            file_name,
            timestamp: None,
            etag: None,
        }
    }

    /// 非空的附件名称
    pub fn attachment_name(&self) -> Option<&str> {
        self.file_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// 待上传的附件内容，仅在创建时存在，从不持久化到记录中
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub content: Bytes,
    pub content_type: String,
}

impl Attachment {
    pub const DEFAULT_CONTENT_TYPE: &'static str = "application/octet-stream";

    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            content_type: Self::DEFAULT_CONTENT_TYPE.to_string(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// 创建任务的输入
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub task_name: String,
    pub assignee: String,
    pub deadline: DateTime<Utc>,
    pub file_name: Option<String>,
    pub attachment: Option<Attachment>,
}

/// 任务创建后发送到消息队列的通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNotification {
    pub message: String,
}

impl TaskNotification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 从队列中取出、尚未确认的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub message_id: String,
    pub pop_receipt: String,
    pub body: String,
    pub dequeue_count: u32,
}

/// 通知发送结果，发送失败不影响任务创建的成功
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum NotificationStatus {
    Sent,
    Failed { reason: String },
}

/// 任务创建成功后的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTask {
    pub id: Uuid,
    pub partition_key: String,
    pub row_key: String,
    pub attachment_uploaded: bool,
    pub notification: NotificationStatus,
}

/// 记录与实时签发的附件 URL 合并后的视图
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetails {
    #[serde(flatten)]
    pub record: TaskEntity,
    pub file_url: Option<String>,
}

/// 单个任务的读取结果，显式携带可选的通知
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub task: TaskDetails,
    pub notification: Option<TaskNotification>,
}

/// Blob 存储中的附件及其签名 URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentLink {
    pub file_name: String,
    pub file_url: String,
}

/// 附件删除未成功的原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum AttachmentDeleteReason {
    Missing,
    Failed { message: String },
}

/// 删除任务时附件未能删除的软警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDeleteWarning {
    pub file_name: String,
    #[serde(flatten)]
    pub reason: AttachmentDeleteReason,
}

/// 删除任务的结果，记录删除是主要效果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    DeletedWithWarning(AttachmentDeleteWarning),
}

impl DeleteOutcome {
    pub fn warning(&self) -> Option<&AttachmentDeleteWarning> {
        match self {
            DeleteOutcome::Deleted => None,
            DeleteOutcome::DeletedWithWarning(warning) => Some(warning),
        }
    }
}
