use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueType {
    InMemory,
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub r#type: QueueType,
    pub url: String,
    pub queue_name: String,
    pub visibility_timeout_seconds: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            r#type: QueueType::Redis,
            url: "redis://localhost:6379".to_string(),
            queue_name: "task-notifications".to_string(),
            visibility_timeout_seconds: 30,
        }
    }
}

impl QueueConfig {
    pub fn in_memory_default() -> Self {
        Self {
            r#type: QueueType::InMemory,
            url: "".to_string(), // 内存队列不需要URL
            ..Self::default()
        }
    }
}

impl ConfigValidator for QueueConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        if self.r#type == QueueType::Redis {
            ValidationUtils::validate_url(&self.url, &["redis", "rediss"], "queue.url")?;
        }
        ValidationUtils::validate_resource_name(&self.queue_name, "queue.queue_name")?;
        ValidationUtils::validate_timeout_seconds(
            self.visibility_timeout_seconds,
            "queue.visibility_timeout_seconds",
        )?;
        Ok(())
    }
}
