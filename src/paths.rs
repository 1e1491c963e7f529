//! Path normalization for completed downloads.
//!
//! A download may produce a single file directly in its directory or a tree of
//! files below a top-level folder. Either way the queue receives the entry that
//! sits exactly one level below the download directory, so a multi-file
//! download is handed downstream as one unit.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("Empty download directory")]
    EmptyDirectory,

    #[error("Path {path:?} is not inside directory {dir:?}")]
    NotUnderDirectory { dir: PathBuf, path: PathBuf },

    #[error("File does not exist: {0:?}")]
    NotFound(PathBuf),

    #[error("Not a file: {0:?}")]
    NotAFile(PathBuf),

    #[error("Path {0:?} has no entry below its directory")]
    NoChildSegment(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Compute the queue path for a completed download.
///
/// `file_path` must lie inside `dir` (compared component by component) and
/// must be an existing regular file. The result is `dir` joined with the first
/// component of `file_path` below `dir`.
pub fn normalize(dir: &Path, file_path: &Path) -> Result<PathBuf, PathError> {
    if dir.as_os_str().is_empty() {
        return Err(PathError::EmptyDirectory);
    }

    let remainder = file_path
        .strip_prefix(dir)
        .map_err(|_| PathError::NotUnderDirectory {
            dir: dir.to_path_buf(),
            path: file_path.to_path_buf(),
        })?;

    match std::fs::metadata(file_path) {
        Ok(meta) if meta.is_dir() => return Err(PathError::NotAFile(file_path.to_path_buf())),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PathError::NotFound(file_path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    }

    match remainder.components().next() {
        Some(Component::Normal(first)) => Ok(dir.join(first)),
        _ => Err(PathError::NoChildSegment(file_path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn test_file_directly_under_dir() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("movie.mkv");
        touch(&file);

        let result = normalize(dir.path(), &file).unwrap();
        assert_eq!(result, file);
    }

    #[test]
    fn test_nested_file_maps_to_first_segment() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a").join("b").join("c.txt");
        touch(&file);

        let result = normalize(dir.path(), &file).unwrap();
        assert_eq!(result, dir.path().join("a"));
    }

    #[test]
    fn test_result_is_always_one_level_deep() {
        let dir = TempDir::new().unwrap();
        for depth in 1..6 {
            let mut file = dir.path().join(format!("top{}", depth));
            for level in 1..depth {
                file = file.join(format!("level{}", level));
            }
            let file = file.join("leaf.bin");
            touch(&file);

            let result = normalize(dir.path(), &file).unwrap();
            let below = result.strip_prefix(dir.path()).unwrap();
            assert_eq!(below.components().count(), 1, "depth {}", depth);
            assert_eq!(result, dir.path().join(format!("top{}", depth)));
        }
    }

    #[test]
    fn test_trailing_separator_on_dir() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("album").join("01.flac");
        touch(&file);

        let dir_with_slash = PathBuf::from(format!("{}/", dir.path().display()));
        let result = normalize(&dir_with_slash, &file).unwrap();
        assert_eq!(result, dir.path().join("album"));
    }

    #[test]
    fn test_path_outside_dir() {
        let result = normalize(Path::new("/d"), Path::new("/elsewhere/a/b.txt"));
        assert!(matches!(result, Err(PathError::NotUnderDirectory { .. })));
    }

    #[test]
    fn test_sibling_with_common_prefix_is_outside() {
        let result = normalize(Path::new("/d"), Path::new("/dx/a.txt"));
        assert!(matches!(result, Err(PathError::NotUnderDirectory { .. })));
    }

    #[test]
    fn test_empty_dir() {
        let result = normalize(Path::new(""), Path::new("/d/a.txt"));
        assert!(matches!(result, Err(PathError::EmptyDirectory)));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gone").join("file.txt");

        let result = normalize(dir.path(), &file);
        assert!(matches!(result, Err(PathError::NotFound(_))));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("folder");
        fs::create_dir_all(&sub).unwrap();

        let result = normalize(dir.path(), &sub);
        assert!(matches!(result, Err(PathError::NotAFile(_))));
    }

    #[test]
    fn test_file_path_equal_to_dir() {
        let dir = TempDir::new().unwrap();
        let result = normalize(dir.path(), dir.path());
        assert!(matches!(result, Err(PathError::NotAFile(_))));
    }
}
