//! 通知队列适配器

mod memory;
mod redis_queue;

pub use memory::InMemoryNotificationQueue;
pub use redis_queue::RedisNotificationQueue;
