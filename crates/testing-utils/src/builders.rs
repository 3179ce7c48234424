//! Test data builders for creating test entities
//!
//! This module provides builder patterns for creating test data with
//! sensible defaults and easy customization.

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use taskboard_domain::{Attachment, NewTask, TaskEntity};
use uuid::Uuid;

/// 2025-01-01T00:00:00Z, the default deadline used by the builders
pub fn default_deadline() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Builder for creating test NewTask inputs
pub struct NewTaskBuilder {
    task: NewTask,
}

impl NewTaskBuilder {
    pub fn new() -> Self {
        Self {
            task: NewTask {
                task_name: "Ship release".to_string(),
                assignee: "alice".to_string(),
                deadline: default_deadline(),
                file_name: None,
                attachment: None,
            },
        }
    }

    pub fn with_task_name(mut self, task_name: &str) -> Self {
        self.task.task_name = task_name.to_string();
        self
    }

    pub fn with_assignee(mut self, assignee: &str) -> Self {
        self.task.assignee = assignee.to_string();
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.task.deadline = deadline;
        self
    }

    /// Set a file name without any payload
    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.task.file_name = Some(file_name.to_string());
        self
    }

    pub fn with_attachment(mut self, file_name: &str, content: impl Into<Bytes>) -> Self {
        self.task.file_name = Some(file_name.to_string());
        self.task.attachment = Some(Attachment::new(content));
        self
    }

    pub fn build(self) -> NewTask {
        self.task
    }
}

impl Default for NewTaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating stored TaskEntity records
pub struct TaskEntityBuilder {
    entity: TaskEntity,
}

impl TaskEntityBuilder {
    pub fn new() -> Self {
        Self {
            entity: TaskEntity::new(
                "Ship release".to_string(),
                "alice".to_string(),
                default_deadline(),
                None,
            ),
        }
    }

    pub fn with_keys(mut self, partition_key: &str, row_key: &str) -> Self {
        self.entity.partition_key = partition_key.to_string();
        self.entity.row_key = row_key.to_string();
        self
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.entity.id = id;
        self.entity.partition_key = id.to_string();
        self
    }

    pub fn with_task_name(mut self, task_name: &str) -> Self {
        self.entity.task_name = task_name.to_string();
        self
    }

    pub fn with_assignee(mut self, assignee: &str) -> Self {
        self.entity.assignee = assignee.to_string();
        self
    }

    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.entity.file_name = Some(file_name.to_string());
        self
    }

    pub fn build(self) -> TaskEntity {
        self.entity
    }
}

impl Default for TaskEntityBuilder {
    fn default() -> Self {
        Self::new()
    }
}
