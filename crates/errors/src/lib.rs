use serde::Serialize;
use std::time::Duration;
use thiserror::Error;


/// 叶子存储客户端的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Backend {
    RecordStore,
    BlobStore,
    Queue,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::RecordStore => write!(f, "表存储"),
            Backend::BlobStore => write!(f, "Blob存储"),
            Backend::Queue => write!(f, "消息队列"),
        }
    }
}

/// 叶子客户端错误
///
/// 由存储适配器产生，编排层不会直接向调用方暴露，而是先归类为 [`TaskError`]。
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{backend}操作 {operation} 失败: {message}")]
    Backend {
        backend: Backend,
        operation: &'static str,
        message: String,
    },
    #[error("{backend}操作 {operation} 超时 ({timeout:?})")]
    Timeout {
        backend: Backend,
        operation: &'static str,
        timeout: Duration,
    },
    #[error("无效的对象名称: {0}")]
    InvalidName(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("配置错误: {0}")]
    Configuration(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    pub fn backend<M: std::fmt::Display>(backend: Backend, operation: &'static str, message: M) -> Self {
        Self::Backend {
            backend,
            operation,
            message: message.to_string(),
        }
    }
    pub fn record_store<M: std::fmt::Display>(operation: &'static str, message: M) -> Self {
        Self::backend(Backend::RecordStore, operation, message)
    }
    pub fn blob_store<M: std::fmt::Display>(operation: &'static str, message: M) -> Self {
        Self::backend(Backend::BlobStore, operation, message)
    }
    pub fn queue<M: std::fmt::Display>(operation: &'static str, message: M) -> Self {
        Self::backend(Backend::Queue, operation, message)
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn is_timeout(&self) -> bool {
        matches!(self, StorageError::Timeout { .. })
    }
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::Backend { .. } | StorageError::Timeout { .. }
        )
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// 编排层对外暴露的失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    InvalidInput,
    NotFound,
    RecordStoreFailure,
    AttachmentFailure,
    NotificationFailure,
}

impl FailureKind {
    /// 通知失败只记录日志，从不作为操作失败返回
    pub fn is_fatal(self) -> bool {
        !matches!(self, FailureKind::NotificationFailure)
    }

    pub fn as_code(self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "INVALID_INPUT",
            FailureKind::NotFound => "NOT_FOUND",
            FailureKind::RecordStoreFailure => "RECORD_STORE_FAILURE",
            FailureKind::AttachmentFailure => "ATTACHMENT_FAILURE",
            FailureKind::NotificationFailure => "NOTIFICATION_FAILURE",
        }
    }
}

/// 任务编排错误
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("请求数据无效: {0}")]
    InvalidInput(String),
    #[error("未找到数据: {0}")]
    NotFound(String),
    #[error("表存储失败: {source}")]
    RecordStore { source: StorageError },
    #[error("附件 {file_name} 处理失败: {source}")]
    Attachment {
        file_name: String,
        source: StorageError,
    },
    #[error("通知发送失败: {source}")]
    Notification { source: StorageError },
}

pub type TaskResult<T> = Result<T, TaskError>;

impl TaskError {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn kind(&self) -> FailureKind {
        match self {
            TaskError::InvalidInput(_) => FailureKind::InvalidInput,
            TaskError::NotFound(_) => FailureKind::NotFound,
            TaskError::RecordStore { .. } => FailureKind::RecordStoreFailure,
            TaskError::Attachment { .. } => FailureKind::AttachmentFailure,
            TaskError::Notification { .. } => FailureKind::NotificationFailure,
        }
    }
    pub fn user_message(&self) -> &str {
        match self {
            TaskError::InvalidInput(_) => "未提供必需的数据",
            TaskError::NotFound(_) => "未找到所需的数据",
            TaskError::RecordStore { .. } => "任务记录写入或读取失败",
            TaskError::Attachment { .. } => "附件处理失败",
            TaskError::Notification { .. } => "任务通知发送失败",
        }
    }
}
