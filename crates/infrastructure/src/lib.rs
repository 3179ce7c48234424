pub mod blob_store;
pub mod queue;
pub mod record_store;
pub mod storage_factory;
pub mod timeout_handler;

pub use blob_store::{InMemoryBlobStore, LocalFsBlobStore, UrlSigner};
pub use queue::{InMemoryNotificationQueue, RedisNotificationQueue};
pub use record_store::{InMemoryRecordStore, SqliteRecordStore};
pub use storage_factory::{StorageClients, StorageFactory};
pub use timeout_handler::{TimedBlobStore, TimedNotificationQueue, TimedRecordStore};
