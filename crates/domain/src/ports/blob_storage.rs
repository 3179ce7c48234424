use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use taskboard_errors::StorageResult;

/// Blob 存储客户端，对象在容器内按名称寻址
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn ensure_container_exists(&self) -> StorageResult<()>;
    /// 覆盖同名对象，旧内容保留为快照
    async fn upload(&self, name: &str, content: Bytes, content_type: &str) -> StorageResult<()>;
    /// 签发只读的限时 URL，纯计算，不检查对象是否存在
    fn signed_read_url(&self, name: &str, ttl: Duration) -> StorageResult<String>;
    /// 返回对象是否存在并已删除。存在快照时必须指定 `include_all_versions`
    async fn delete(&self, name: &str, include_all_versions: bool) -> StorageResult<bool>;
    async fn list_names(&self) -> StorageResult<Vec<String>>;
}
