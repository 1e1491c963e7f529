//! Redis-backed queue producer.

use super::{QueueError, QueueProducer};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Appends entries to Redis lists with `RPUSH`.
///
/// The connection is opened by the first append, so the process starts even
/// when Redis is down; a failed connect is retried by the next append. Once
/// open, the connection manager reconnects in the background after a drop;
/// an append issued while disconnected fails and is not replayed.
pub struct RedisQueue {
    client: redis::Client,
    address: String,
    connection: OnceCell<ConnectionManager>,
}

impl RedisQueue {
    /// Validate the connection URL without connecting.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://127.0.0.1:6379/0")
    pub fn open(url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            address: redacted(url),
            connection: OnceCell::new(),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    async fn connection(&self) -> Result<ConnectionManager, QueueError> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                let connection = ConnectionManager::new(self.client.clone()).await?;
                info!("Connected to Redis at {}", self.address);
                Ok::<_, QueueError>(connection)
            })
            .await?;
        Ok(connection.clone())
    }
}

#[async_trait]
impl QueueProducer for RedisQueue {
    async fn append(&self, queue: &str, value: &str) -> Result<u64, QueueError> {
        if queue.is_empty() {
            return Err(QueueError::EmptyQueueName);
        }
        let mut connection = self.connection().await?;
        let len: u64 = connection.rpush(queue, value).await?;
        debug!("RPUSH {} -> length {}", queue, len);
        Ok(len)
    }
}

/// Strip credentials from a connection URL before logging it.
fn redacted(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => match rest.rsplit_once('@') {
            Some((_, host)) => format!("{}://***@{}", scheme, host),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}
