use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use taskboard_domain::{
    deserialize_deadline, validate_file_name, AttachmentDeleteWarning, DeleteOutcome, NewTask,
    TaskError,
};

use crate::{
    error::{ApiError, ApiResult},
    file_codec::decode_attachment,
    response::{success, ApiResponse},
    routes::AppState,
};

/// 附件删除未成功时附带的提示
pub const ATTACHMENT_DELETE_WARNING_MESSAGE: &str = "Uploaded file is not successfully deleted.";

/// 任务创建请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub task_name: String,
    pub assignee: String,
    #[serde(deserialize_with = "deserialize_deadline")]
    pub deadline: DateTime<Utc>,
    pub file_name: Option<String>,
    pub base64_file: Option<String>,
}

impl CreateTaskRequest {
    fn into_new_task(self) -> ApiResult<NewTask> {
        let file_name = non_empty(self.file_name);
        if let Some(name) = &file_name {
            validate_file_name(name).map_err(TaskError::invalid_input)?;
        }
        let attachment = match (&file_name, non_empty(self.base64_file)) {
            (Some(_), Some(raw)) => Some(
                decode_attachment(&raw).map_err(|e| TaskError::invalid_input(e.to_string()))?,
            ),
            _ => None,
        };

        Ok(NewTask {
            task_name: self.task_name,
            assignee: self.assignee,
            deadline: self.deadline,
            file_name,
            attachment,
        })
    }
}

/// 定位单个任务及其附件的查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskKeyParams {
    pub partition_key: Option<String>,
    pub row_key: Option<String>,
    pub file_name: Option<String>,
}

impl TaskKeyParams {
    fn require(self) -> ApiResult<(String, String, String)> {
        let partition_key = required(self.partition_key, "partitionKey")?;
        let row_key = required(self.row_key, "rowKey")?;
        let file_name = required(self.file_name, "fileName")?;
        validate_file_name(&file_name).map_err(TaskError::invalid_input)?;
        Ok((partition_key, row_key, file_name))
    }
}

/// 删除任务的响应数据
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedTask {
    pub partition_key: String,
    pub row_key: String,
    pub attachment_warning: Option<AttachmentDeleteWarning>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    non_empty(value).ok_or_else(|| ApiError::missing_parameter(name))
}

/// 创建任务
pub async fn create_task(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    // 空请求体和 `null` 都视为未提供数据，交由编排层判定
    let request: Option<CreateTaskRequest> = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice(&body).map_err(|e| TaskError::invalid_input(e.to_string()))?
    };

    let input = request.map(CreateTaskRequest::into_new_task).transpose()?;
    let created = state.orchestrator.create_task(input).await?;

    debug!(partition_key = %created.partition_key, "任务创建成功");
    Ok(success(created))
}

/// 获取单个任务
pub async fn get_task(
    State(state): State<AppState>,
    Query(params): Query<TaskKeyParams>,
) -> ApiResult<impl IntoResponse> {
    let (partition_key, row_key, file_name) = params.require()?;
    let view = state
        .orchestrator
        .get_task(&partition_key, &row_key, &file_name)
        .await?;
    Ok(success(view))
}

/// 获取任务列表
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let tasks = state.orchestrator.list_tasks().await?;
    Ok(success(tasks))
}

/// 列出全部附件
pub async fn list_files(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let files = state.orchestrator.list_attachments().await?;
    Ok(success(files))
}

/// 删除任务
pub async fn delete_task(
    State(state): State<AppState>,
    Query(params): Query<TaskKeyParams>,
) -> ApiResult<impl IntoResponse> {
    let (partition_key, row_key, file_name) = params.require()?;
    let outcome = state
        .orchestrator
        .delete_task(&partition_key, &row_key, &file_name)
        .await?;

    let response = match outcome {
        DeleteOutcome::Deleted => ApiResponse::success(DeletedTask {
            partition_key,
            row_key,
            attachment_warning: None,
        }),
        DeleteOutcome::DeletedWithWarning(warning) => {
            warn!(file_name = %warning.file_name, "任务已删除，但附件未能删除");
            ApiResponse::success_with_message(
                DeletedTask {
                    partition_key,
                    row_key,
                    attachment_warning: Some(warning),
                },
                ATTACHMENT_DELETE_WARNING_MESSAGE.to_string(),
            )
        }
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_uses_camel_case() {
        let request: CreateTaskRequest = serde_json::from_str(
            r#"{"taskName":"Ship release","assignee":"alice","deadline":"2025-01-01T00:00:00Z","fileName":"a.txt","base64File":"aGVsbG8="}"#,
        )
        .unwrap();

        let task = request.into_new_task().unwrap();
        assert_eq!(task.task_name, "Ship release");
        assert_eq!(task.file_name.as_deref(), Some("a.txt"));
        assert_eq!(&task.attachment.unwrap().content[..], b"hello");
    }

    #[test]
    fn test_attachment_requires_both_name_and_content() {
        let request: CreateTaskRequest = serde_json::from_str(
            r#"{"taskName":"t","assignee":"a","deadline":"2025-01-01T00:00:00","fileName":"a.txt","base64File":""}"#,
        )
        .unwrap();
        let task = request.into_new_task().unwrap();
        assert_eq!(task.file_name.as_deref(), Some("a.txt"));
        assert!(task.attachment.is_none());

        let request: CreateTaskRequest = serde_json::from_str(
            r#"{"taskName":"t","assignee":"a","deadline":"2025-01-01T00:00:00","fileName":"","base64File":"aGVsbG8="}"#,
        )
        .unwrap();
        let task = request.into_new_task().unwrap();
        assert!(task.file_name.is_none());
        assert!(task.attachment.is_none());
    }

    #[test]
    fn test_undecodable_file_is_invalid_input() {
        let request: CreateTaskRequest = serde_json::from_str(
            r#"{"taskName":"t","assignee":"a","deadline":"2025-01-01T00:00:00Z","fileName":"a.txt","base64File":"***"}"#,
        )
        .unwrap();
        assert!(matches!(
            request.into_new_task(),
            Err(ApiError::Task(TaskError::InvalidInput(_)))
        ));
    }

    #[test]
    fn test_key_params_require_every_value() {
        let params = TaskKeyParams {
            partition_key: Some("pk".to_string()),
            row_key: Some("  ".to_string()),
            file_name: Some("a.txt".to_string()),
        };
        assert!(matches!(params.require(), Err(ApiError::BadRequest(_))));
        assert!(TaskKeyParams::default().require().is_err());
    }

    #[test]
    fn test_unsafe_file_name_is_invalid_input() {
        let request: CreateTaskRequest = serde_json::from_str(
            r#"{"taskName":"t","assignee":"a","deadline":"2025-01-01T00:00:00Z","fileName":"../x"}"#,
        )
        .unwrap();
        assert!(matches!(
            request.into_new_task(),
            Err(ApiError::Task(TaskError::InvalidInput(_)))
        ));

        let params = TaskKeyParams {
            partition_key: Some("pk".to_string()),
            row_key: Some("rk".to_string()),
            file_name: Some("/etc/passwd".to_string()),
        };
        assert!(matches!(
            params.require(),
            Err(ApiError::Task(TaskError::InvalidInput(_)))
        ));
    }
}
