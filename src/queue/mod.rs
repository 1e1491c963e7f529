//! Work queue module
//!
//! Appends paths to a named, shared, unbounded queue consumed by a separate
//! downstream worker. Redis lists are the production backend.

mod memory_queue;
mod redis_queue;

pub use memory_queue::MemoryQueue;
pub use redis_queue::RedisQueue;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Queue name cannot be empty")]
    EmptyQueueName,

    #[error("In-memory queue is poisoned")]
    Poisoned,
}

/// Tail-append producer for a named queue.
#[async_trait]
pub trait QueueProducer: Send + Sync {
    /// Append `value` to the tail of `queue`, returning the queue length
    /// after the append.
    async fn append(&self, queue: &str, value: &str) -> Result<u64, QueueError>;
}
