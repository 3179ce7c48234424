use std::sync::Arc;
use std::time::Duration;

use taskboard_errors::{TaskError, TaskResult};
use tracing::{debug, info, instrument, warn};

use crate::entities::{
    AttachmentDeleteReason, AttachmentDeleteWarning, AttachmentLink, CreatedTask, DeleteOutcome,
    NewTask, NotificationStatus, TaskDetails, TaskEntity, TaskNotification, TaskView,
};
use crate::ports::{BlobStore, NotificationQueue};
use crate::repositories::RecordStore;

use super::classification::{attachment_failure, notification_failure, record_store_failure};
use super::reconciliation::{derive_file_url, drain_notification, listed_file_url, merge};
use crate::value_objects::validate_file_name;

/// 编排器的可调参数
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// 签名 URL 的有效期
    pub url_ttl: Duration,
    /// 任务创建成功后发送的通知内容
    pub notification_message: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            url_ttl: Duration::from_secs(60),
            notification_message: "A new task successfully added.".to_string(),
        }
    }
}

/// 任务编排器 - 在表存储、Blob存储与通知队列之间按固定顺序执行每个逻辑操作
///
/// 三个存储之间没有联合事务。创建时的失败处理顺序是固定的：
/// 记录写入失败立即终止；附件上传失败会报告给调用方，但已写入的记录保留；
/// 通知失败只记录日志。
pub struct TaskOrchestrator {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    notifications: Arc<dyn NotificationQueue>,
    settings: OrchestratorSettings,
}

impl TaskOrchestrator {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        notifications: Arc<dyn NotificationQueue>,
    ) -> Self {
        Self::with_settings(records, blobs, notifications, OrchestratorSettings::default())
    }

    pub fn with_settings(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        notifications: Arc<dyn NotificationQueue>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            records,
            blobs,
            notifications,
            settings,
        }
    }

    /// 创建任务：写入记录，上传附件（如有），发送通知
    #[instrument(skip(self, input))]
    pub async fn create_task(&self, input: Option<NewTask>) -> TaskResult<CreatedTask> {
        let input = input.ok_or_else(|| TaskError::invalid_input("请求体为空"))?;
        let NewTask {
            task_name,
            assignee,
            deadline,
            file_name,
            attachment,
        } = input;
        if let Some(file_name) = &file_name {
            validate_file_name(file_name).map_err(TaskError::invalid_input)?;
        }

        // 1. 分配标识并写入记录
        let entity = TaskEntity::new(task_name, assignee, deadline, file_name);
        info!(
            partition_key = %entity.partition_key,
            row_key = %entity.row_key,
            "写入任务记录: {}",
            entity.task_name
        );
        self.records
            .upsert_replace(&entity)
            .await
            .map_err(|e| record_store_failure("upsert_replace", e))?;

        // 2. 上传附件，失败时记录已存在，不做补偿删除
        let attachment_uploaded = match (entity.attachment_name(), attachment) {
            (Some(file_name), Some(attachment)) if !attachment.content.is_empty() => {
                debug!(file_name, size = attachment.content.len(), "上传附件");
                self.blobs
                    .upload(file_name, attachment.content, &attachment.content_type)
                    .await
                    .map_err(|e| {
                        warn!(
                            partition_key = %entity.partition_key,
                            row_key = %entity.row_key,
                            "附件上传失败，任务记录已写入且不会回滚"
                        );
                        attachment_failure(file_name, e)
                    })?;
                true
            }
            _ => false,
        };

        // 3. 发送通知，失败不影响结果
        let notification = self.send_notification().await;

        info!(task_id = %entity.id, "任务创建完成");
        Ok(CreatedTask {
            id: entity.id,
            partition_key: entity.partition_key,
            row_key: entity.row_key,
            attachment_uploaded,
            notification,
        })
    }

    async fn send_notification(&self) -> NotificationStatus {
        let payload = match serde_json::to_string(&TaskNotification::new(
            self.settings.notification_message.clone(),
        )) {
            Ok(payload) => payload,
            Err(e) => {
                let err = notification_failure("send", e.into());
                return NotificationStatus::Failed {
                    reason: err.to_string(),
                };
            }
        };

        match self.notifications.send(&payload).await {
            Ok(true) => NotificationStatus::Sent,
            Ok(false) => {
                warn!("通知队列不存在，跳过发送");
                NotificationStatus::Failed {
                    reason: "通知队列不存在".to_string(),
                }
            }
            Err(e) => {
                let err = notification_failure("send", e);
                NotificationStatus::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// 读取单个任务，为 `file_name` 签发 URL，并顺带取出一条待处理通知
    #[instrument(skip(self))]
    pub async fn get_task(
        &self,
        partition_key: &str,
        row_key: &str,
        file_name: &str,
    ) -> TaskResult<TaskView> {
        validate_file_name(file_name).map_err(TaskError::invalid_input)?;
        let record = self
            .records
            .get(partition_key, row_key)
            .await
            .map_err(|e| record_store_failure("get", e))?
            .ok_or_else(|| TaskError::not_found(format!("{partition_key}/{row_key}")))?;

        let file_url = derive_file_url(self.blobs.as_ref(), file_name, self.settings.url_ttl)?;
        let notification = drain_notification(self.notifications.as_ref()).await;

        Ok(TaskView {
            task: merge(record, Some(file_url)),
            notification,
        })
    }

    /// 列出全部任务，仅为带附件名的记录签发 URL
    #[instrument(skip(self))]
    pub async fn list_tasks(&self) -> TaskResult<Vec<TaskDetails>> {
        let records = self
            .records
            .scan_all()
            .await
            .map_err(|e| record_store_failure("scan_all", e))?;

        if records.is_empty() {
            return Err(TaskError::not_found("任务列表为空"));
        }

        let mut tasks = Vec::with_capacity(records.len());
        for record in records {
            let file_url = record.attachment_name().and_then(|file_name| {
                listed_file_url(self.blobs.as_ref(), file_name, self.settings.url_ttl)
            });
            tasks.push(merge(record, file_url));
        }

        debug!(count = tasks.len(), "列出任务");
        Ok(tasks)
    }

    /// 枚举 Blob 存储中的全部附件并签发 URL
    #[instrument(skip(self))]
    pub async fn list_attachments(&self) -> TaskResult<Vec<AttachmentLink>> {
        let names = self
            .blobs
            .list_names()
            .await
            .map_err(|e| attachment_failure("*", e))?;

        if names.is_empty() {
            return Err(TaskError::not_found("附件列表为空"));
        }

        let links = names
            .into_iter()
            .filter_map(|file_name| {
                let file_url =
                    listed_file_url(self.blobs.as_ref(), &file_name, self.settings.url_ttl)?;
                Some(AttachmentLink {
                    file_name,
                    file_url,
                })
            })
            .collect();
        Ok(links)
    }

    /// 删除任务记录，然后尽力删除附件及其全部快照
    #[instrument(skip(self))]
    pub async fn delete_task(
        &self,
        partition_key: &str,
        row_key: &str,
        file_name: &str,
    ) -> TaskResult<DeleteOutcome> {
        validate_file_name(file_name).map_err(TaskError::invalid_input)?;
        let existed = self
            .records
            .delete(partition_key, row_key)
            .await
            .map_err(|e| record_store_failure("delete", e))?;
        if !existed {
            debug!("任务记录不存在，按删除成功处理");
        }

        let reason = match self.blobs.delete(file_name, true).await {
            Ok(true) => {
                info!(file_name, "任务及附件已删除");
                return Ok(DeleteOutcome::Deleted);
            }
            Ok(false) => AttachmentDeleteReason::Missing,
            Err(e) => AttachmentDeleteReason::Failed {
                message: e.to_string(),
            },
        };

        warn!(file_name, ?reason, "任务记录已删除，附件未能删除");
        Ok(DeleteOutcome::DeletedWithWarning(AttachmentDeleteWarning {
            file_name: file_name.to_string(),
            reason,
        }))
    }
}
