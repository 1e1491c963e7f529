//! Completion handling.
//!
//! For every completed download: ask aria2 where it landed, reduce the first
//! file's path to the entry directly below the download directory, and push
//! that entry to the work queue. Each event is handled on its own; a failure
//! is logged and the next event is processed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::aria2::{Aria2Error, Event, StatusResolver};
use crate::notifier::Notifier;
use crate::paths::{self, PathError};
use crate::queue::{QueueError, QueueProducer};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Failed to query status of {gid}: {source}")]
    Status {
        gid: String,
        #[source]
        source: Aria2Error,
    },

    #[error("Download {0} has no files")]
    NoFiles(String),

    #[error("Cannot derive queue path for {gid}: {source}")]
    Path {
        gid: String,
        #[source]
        source: PathError,
    },

    #[error("Failed to enqueue {path:?}: {source}")]
    Enqueue {
        path: PathBuf,
        #[source]
        source: QueueError,
    },

    #[error("Path is not valid UTF-8: {0:?}")]
    NonUtf8Path(PathBuf),
}

/// [`Notifier`] that enqueues completed downloads.
pub struct CompletionNotifier {
    resolver: Arc<dyn StatusResolver>,
    queue: Arc<dyn QueueProducer>,
    queue_name: String,
}

impl CompletionNotifier {
    pub fn new(
        resolver: Arc<dyn StatusResolver>,
        queue: Arc<dyn QueueProducer>,
        queue_name: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            queue,
            queue_name: queue_name.into(),
        }
    }

    /// Resolve, normalize and enqueue one completed download.
    ///
    /// Returns the enqueued path.
    pub async fn handle_event(&self, event: &Event) -> Result<PathBuf, CompletionError> {
        info!("Complete gid = {}", event.gid);

        let status = self
            .resolver
            .tell_status(&event.gid)
            .await
            .map_err(|source| CompletionError::Status {
                gid: event.gid.clone(),
                source,
            })?;
        info!("Download path is {}", status.dir);

        let file = status
            .primary_file()
            .ok_or_else(|| CompletionError::NoFiles(event.gid.clone()))?;

        let path = paths::normalize(Path::new(&status.dir), Path::new(&file.path)).map_err(
            |source| CompletionError::Path {
                gid: event.gid.clone(),
                source,
            },
        )?;
        let value = path
            .to_str()
            .ok_or_else(|| CompletionError::NonUtf8Path(path.clone()))?;

        info!("Enqueue path: {}", value);
        self.queue
            .append(&self.queue_name, value)
            .await
            .map_err(|source| CompletionError::Enqueue {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

#[async_trait]
impl Notifier for CompletionNotifier {
    async fn on_complete(&self, events: &[Event]) {
        for event in events {
            match self.handle_event(event).await {
                Ok(_) => {}
                Err(e @ CompletionError::NoFiles(_)) => warn!("{}", e),
                Err(e) => error!("{}", e),
            }
        }
    }
}
