//! # Taskboard Testing Utils
//!
//! Shared testing utilities for the taskboard workspace.
//!
//! ## Features
//!
//! - **Recording fakes**: in-memory record store, blob store and notification queue
//!   that append every call to one shared, ordered [`CallLog`]
//! - **Failure injection**: any fake operation can be told to fail with a backend error
//! - **Test data builders**: [`NewTaskBuilder`] and [`TaskEntityBuilder`]
//!
//! ## Usage
//!
//! ```toml
//! [dev-dependencies]
//! taskboard-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! ```rust,ignore
//! use taskboard_testing_utils::{MockStores, NewTaskBuilder};
//!
//! let stores = MockStores::new();
//! stores.blobs.fail_on("upload");
//! let orchestrator = stores.orchestrator();
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

// Re-export commonly used items
pub use builders::*;
pub use helpers::*;
pub use mocks::*;
