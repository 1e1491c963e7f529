//! On-disk download directory fixtures

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary aria2 download directory, removed on drop.
pub struct DownloadDir {
    dir: TempDir,
}

impl DownloadDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create download dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create `relative` with some content and return its absolute path.
    pub fn file(&self, relative: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().expect("file has a parent"))
            .expect("Failed to create parent dirs");
        fs::write(&path, b"data").expect("Failed to write file");
        path
    }

    /// album/cd1/01.flac
    pub fn album(&self) -> PathBuf {
        self.file("album/cd1/01.flac")
    }

    /// movie.mkv
    pub fn movie(&self) -> PathBuf {
        self.file("movie.mkv")
    }
}
