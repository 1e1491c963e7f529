//! Collects files to enqueue from a path on disk.
//!
//! A file is taken as is. A directory is walked recursively and every file
//! whose extension is not on the ignore list is collected.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use walkdir::WalkDir;

use crate::queue::{QueueError, QueueProducer};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Path does not exist: {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to walk {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Path is not valid UTF-8: {0:?}")]
    NonUtf8Path(PathBuf),

    #[error("Failed to enqueue {path:?}: {source}")]
    Enqueue {
        path: PathBuf,
        #[source]
        source: QueueError,
    },
}

/// Extension filter, case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    extensions: HashSet<String>,
}

impl IgnoreList {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                self.extensions
                    .contains(&ext.to_string_lossy().to_lowercase())
            })
            .unwrap_or(false)
    }
}

/// Lowercase an extension and drop any leading dots.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Files under `path` to enqueue, in file-name order within each directory.
///
/// A regular file is returned as is, even if its extension is ignored.
pub fn collect_files(path: &Path, ignore: &IgnoreList) -> Result<Vec<PathBuf>, ScanError> {
    if !path.exists() {
        return Err(ScanError::NotFound(path.to_path_buf()));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: path.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && !ignore.is_ignored(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Paths to enqueue for an aria2 `on-download-complete` hook call.
///
/// aria2 passes a file count of 0 for downloads that produced nothing, such
/// as metadata-only torrents.
pub fn hook_paths(file_count: u64, path: &Path) -> Vec<PathBuf> {
    if file_count == 0 {
        Vec::new()
    } else {
        vec![path.to_path_buf()]
    }
}

/// Append every path to `queue_name`, stopping at the first failure.
///
/// Returns the number of paths enqueued.
pub async fn enqueue_files(
    queue: &dyn QueueProducer,
    queue_name: &str,
    files: &[PathBuf],
) -> Result<usize, ScanError> {
    for path in files {
        let value = path
            .to_str()
            .ok_or_else(|| ScanError::NonUtf8Path(path.clone()))?;
        info!("enqueue {}: {}", queue_name, value);
        queue
            .append(queue_name, value)
            .await
            .map_err(|source| ScanError::Enqueue {
                path: path.clone(),
                source,
            })?;
    }
    Ok(files.len())
}
