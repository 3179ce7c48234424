use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub bind_address: String,
    pub cors_enabled: bool,
    pub cors_origins: Vec<String>,
    pub max_request_size_mb: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
            max_request_size_mb: 10,
        }
    }
}

impl ConfigValidator for ApiConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        self.bind_address.parse::<SocketAddr>().map_err(|e| {
            crate::ConfigError::Validation(format!(
                "api.bind_address is not a valid socket address: {e}"
            ))
        })?;
        ValidationUtils::validate_count(self.max_request_size_mb, "api.max_request_size_mb")?;
        if self.max_request_size_mb > 100 {
            return Err(crate::ConfigError::Validation(
                "api.max_request_size_mb must be less than or equal to 100".to_string(),
            ));
        }
        Ok(())
    }
}

impl ApiConfig {
    pub fn max_request_size_bytes(&self) -> usize {
        self.max_request_size_mb * 1024 * 1024
    }
}
