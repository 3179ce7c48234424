//! # Taskboard API
//!
//! 任务存储服务的 REST 接口，基于 Axum 构建。所有业务端点位于 `/api/storage` 下：
//!
//! - `POST /api/storage/create-record` - 创建任务，可附带 base64 编码的附件
//! - `GET /api/storage/get-task?partitionKey&rowKey&fileName` - 读取单个任务并签发附件 URL
//! - `GET /api/storage/get-tasks` - 列出全部任务
//! - `DELETE /api/storage/delete-task?partitionKey&rowKey&fileName` - 删除任务及其附件
//! - `GET /api/storage/get-files` - 列出全部附件
//! - `GET /health` - 存活检查
//!
//! ## 响应格式
//!
//! 成功响应：
//! ```json
//! { "success": true, "data": { ... }, "message": null, "timestamp": "2025-01-01T00:00:00Z" }
//! ```
//!
//! 错误响应：
//! ```json
//! {
//!   "error": {
//!     "message": "Required data is not provided.",
//!     "type": "INVALID_INPUT",
//!     "code": 400,
//!     "details": "...",
//!     "timestamp": "2025-01-01T00:00:00Z"
//!   }
//! }
//! ```

pub mod error;
pub mod file_codec;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;

use middleware::{body_limit_layer, cors_layer, request_logging, trace_layer};
use routes::{create_routes, AppState};
use taskboard_config::ApiConfig;
use taskboard_domain::TaskOrchestrator;

/// 创建完整的API应用
pub fn create_app(orchestrator: Arc<TaskOrchestrator>, api_config: &ApiConfig) -> Router {
    let state = AppState { orchestrator };

    let router = create_routes(state)
        .layer(DefaultBodyLimit::disable())
        .layer(body_limit_layer(api_config.max_request_size_bytes()))
        .layer(axum::middleware::from_fn(request_logging));

    let router = if api_config.cors_enabled {
        router.layer(cors_layer(&api_config.cors_origins))
    } else {
        router
    };

    router.layer(trace_layer())
}
