use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 每次叶子存储调用的超时时间
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub record_store_seconds: u64,
    pub blob_store_seconds: u64,
    pub queue_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            record_store_seconds: 10,
            blob_store_seconds: 30,
            queue_seconds: 5,
        }
    }
}

impl TimeoutConfig {
    pub fn record_store(&self) -> Duration {
        Duration::from_secs(self.record_store_seconds)
    }

    pub fn blob_store(&self) -> Duration {
        Duration::from_secs(self.blob_store_seconds)
    }

    pub fn queue(&self) -> Duration {
        Duration::from_secs(self.queue_seconds)
    }
}

impl ConfigValidator for TimeoutConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_timeout_seconds(
            self.record_store_seconds,
            "timeouts.record_store_seconds",
        )?;
        ValidationUtils::validate_timeout_seconds(
            self.blob_store_seconds,
            "timeouts.blob_store_seconds",
        )?;
        ValidationUtils::validate_timeout_seconds(self.queue_seconds, "timeouts.queue_seconds")?;
        Ok(())
    }
}
