pub mod entities;
pub mod ports;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use ports::{BlobStore, NotificationQueue};
pub use repositories::RecordStore;
pub use services::{OrchestratorSettings, TaskOrchestrator};
pub use taskboard_errors::{FailureKind, StorageError, StorageResult, TaskError, TaskResult};
pub use value_objects::*;
