//! 表存储适配器

mod memory;
mod sqlite;

pub use memory::InMemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use chrono::{DateTime, Utc};

/// 按写入时间生成弱 ETag，每次写入都会变化
pub(crate) fn weak_etag(timestamp: DateTime<Utc>, version: u64) -> String {
    format!(
        "W/\"datetime'{}'-{}\"",
        timestamp.format("%Y-%m-%dT%H:%M:%S%.6fZ"),
        version
    )
}
