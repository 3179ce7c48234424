pub mod blob_storage;
pub mod messaging;

pub use blob_storage::BlobStore;
pub use messaging::NotificationQueue;
