//! Blob 存储适配器
//!
//! 对象在容器内按名称寻址。覆盖写入时旧内容保留为快照，删除存在快照的对象时
//! 必须同时删除快照。读取 URL 由 [`UrlSigner`] 离线签发。

mod local;
mod memory;
mod signer;

pub use local::LocalFsBlobStore;
pub use memory::InMemoryBlobStore;
pub use signer::UrlSigner;

use taskboard_domain::validate_file_name;
use taskboard_errors::{StorageError, StorageResult};

/// 对象名称与附件名称遵循同一规则
pub fn validate_blob_name(name: &str) -> StorageResult<()> {
    validate_file_name(name).map_err(|_| StorageError::InvalidName(name.to_string()))
}

/// 快照存在而调用方未要求删除全部版本
pub(crate) fn snapshots_present(name: &str, count: usize) -> StorageError {
    StorageError::blob_store(
        "delete",
        format!("对象 {name} 存在 {count} 个快照，必须同时删除快照"),
    )
}
