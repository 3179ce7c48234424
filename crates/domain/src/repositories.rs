//! 领域仓储抽象
//!
//! 任务记录的表存储接口，按 (partition, row) 复合键寻址

use async_trait::async_trait;
use taskboard_errors::StorageResult;

use crate::entities::TaskEntity;

/// 表存储客户端
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 启动时调用，表已存在时不做任何事
    async fn ensure_table_exists(&self) -> StorageResult<()>;
    /// 以替换语义写入，同键的旧记录被整体覆盖（后写者胜）
    async fn upsert_replace(&self, entity: &TaskEntity) -> StorageResult<TaskEntity>;
    async fn get(&self, partition_key: &str, row_key: &str) -> StorageResult<Option<TaskEntity>>;
    async fn scan_all(&self) -> StorageResult<Vec<TaskEntity>>;
    /// 幂等删除，记录不存在同样返回 `Ok`，返回值表示是否真的删除了记录
    async fn delete(&self, partition_key: &str, row_key: &str) -> StorageResult<bool>;
}
