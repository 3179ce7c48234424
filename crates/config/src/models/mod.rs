pub mod api;
pub mod app_config;
pub mod logging;
pub mod queue;
pub mod stores;
pub mod timeouts;

pub use api::*;
pub use app_config::*;
pub use logging::*;
pub use queue::*;
pub use stores::*;
pub use timeouts::*;
