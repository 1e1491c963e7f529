use super::{QueueError, QueueProducer};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// In-process queue. Used for dry runs, where entries are only logged, and as
/// a stand-in for Redis in tests.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    queues: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entries currently in `queue`, head first.
    pub fn entries(&self, queue: &str) -> Vec<String> {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(queue)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(queue)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self, queue: &str) -> bool {
        self.len(queue) == 0
    }
}

#[async_trait]
impl QueueProducer for MemoryQueue {
    async fn append(&self, queue: &str, value: &str) -> Result<u64, QueueError> {
        if queue.is_empty() {
            return Err(QueueError::EmptyQueueName);
        }
        let mut queues = self.queues.lock().map_err(|_| QueueError::Poisoned)?;
        let entries = queues.entry(queue.to_string()).or_default();
        entries.push(value.to_string());
        info!("[memory] {} <- {}", queue, value);
        Ok(entries.len() as u64)
    }
}
