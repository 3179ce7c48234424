use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use taskboard_domain::TaskOrchestrator;

use crate::handlers::{
    health::health_check,
    tasks::{create_task, delete_task, get_task, list_files, list_tasks},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TaskOrchestrator>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 任务存储API
        .route("/api/storage/create-record", post(create_task))
        .route("/api/storage/get-task", get(get_task))
        .route("/api/storage/get-tasks", get(list_tasks))
        .route("/api/storage/delete-task", delete(delete_task))
        .route("/api/storage/get-files", get(list_files))
        .with_state(state)
}
