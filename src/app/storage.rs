//! Output file storage for normalized datasets
//!
//! Each dataset has one deterministic path under the output directory. Files
//! are written to a sibling temp file first and renamed into place, so a
//! reader never observes a partially written dataset.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::constants::files;
use crate::errors::{StorageError, StorageResult};

/// Writes normalized datasets under a single output directory
#[derive(Debug, Clone)]
pub struct DatasetStore {
    output_dir: PathBuf,
}

impl DatasetStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Destination path for `dataset_id`
    ///
    /// Bytes outside `[A-Za-z0-9._-]` are percent-encoded, `%` included, so
    /// an id can never escape the output directory and distinct ids never
    /// share a file.
    pub fn path_for(&self, dataset_id: &str) -> PathBuf {
        let mut name = encode_file_stem(dataset_id);
        name.push('.');
        name.push_str(files::DATASET_EXTENSION);
        self.output_dir.join(name)
    }

    /// Atomically write `content` as the dataset's output file
    ///
    /// Replaces any previous file for the same dataset.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory, temp file or write fails,
    /// and `StorageError::AtomicOperationFailed` if the final rename fails
    pub async fn write_atomic(&self, dataset_id: &str, content: &[u8]) -> StorageResult<PathBuf> {
        let destination = self.path_for(dataset_id);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| StorageError::Io {
                path: self.output_dir.clone(),
                source,
            })?;

        let temp_path = temp_path_for(&destination);
        if let Err(e) = write_file(&temp_path, content).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        if tokio::fs::rename(&temp_path, &destination).await.is_err() {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::AtomicOperationFailed {
                temp_path,
                final_path: destination,
            });
        }

        debug!("Wrote {} bytes to {}", content.len(), destination.display());
        Ok(destination)
    }

    /// Remove the temp file an interrupted write may have left for `dataset_id`
    ///
    /// The dataset's existing output file is never touched.
    pub async fn discard_partial(&self, dataset_id: &str) {
        let temp_path = temp_path_for(&self.path_for(dataset_id));
        match tokio::fs::remove_file(&temp_path).await {
            Ok(()) => debug!("Removed partial file {}", temp_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove partial file {}: {}", temp_path.display(), e),
        }
    }
}

async fn write_file(path: &Path, content: &[u8]) -> StorageResult<()> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;
    file.write_all(content).await.map_err(io_err)?;
    file.sync_all().await.map_err(io_err)?;
    Ok(())
}

fn temp_path_for(destination: &Path) -> PathBuf {
    destination.with_extension(format!(
        "{}{}",
        destination
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or(""),
        files::TEMP_FILE_SUFFIX
    ))
}

fn encode_file_stem(dataset_id: &str) -> String {
    let mut stem = String::with_capacity(dataset_id.len());
    for byte in dataset_id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_is_deterministic_and_contained() {
        let store = DatasetStore::new("/data/out");
        assert_eq!(
            store.path_for("xubh-q36u"),
            PathBuf::from("/data/out/xubh-q36u.csv")
        );
        assert_eq!(
            store.path_for("../etc/passwd"),
            PathBuf::from("/data/out/..%2Fetc%2Fpasswd.csv")
        );
        assert_eq!(
            store.path_for("café 1"),
            PathBuf::from("/data/out/caf%C3%A9%201.csv")
        );
    }

    #[test]
    fn test_distinct_ids_get_distinct_paths() {
        let store = DatasetStore::new("/data/out");
        let ids = ["a/b", "a_b", "a%2Fb", "a%b", "a b", "a.b", "A/B"];
        let paths: std::collections::HashSet<PathBuf> =
            ids.iter().map(|id| store.path_for(id)).collect();
        assert_eq!(paths.len(), ids.len());
        for path in &paths {
            assert_eq!(path.parent(), Some(Path::new("/data/out")));
        }
    }

    #[test]
    fn test_temp_path_generation() {
        let temp = temp_path_for(Path::new("/tmp/abc.csv"));
        assert!(temp.to_string_lossy().ends_with("abc.csv.tmp"));
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_replaces_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::new(temp_dir.path().join("out"));

        let first = store.write_atomic("abc", b"one").await.unwrap();
        let second = store.write_atomic("abc", b"two").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
        let entries: Vec<_> = std::fs::read_dir(store.output_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("abc.csv")]);
    }

    #[tokio::test]
    async fn test_discard_partial_keeps_finished_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::new(temp_dir.path());
        let finished = store.write_atomic("abc", b"done").await.unwrap();
        let partial = temp_path_for(&finished);
        std::fs::write(&partial, b"half").unwrap();

        store.discard_partial("abc").await;
        store.discard_partial("never-written").await;

        assert!(!partial.exists());
        assert_eq!(std::fs::read(&finished).unwrap(), b"done");
    }

    #[tokio::test]
    async fn test_write_into_unusable_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let store = DatasetStore::new(&blocker);
        assert!(matches!(
            store.write_atomic("abc", b"data").await,
            Err(StorageError::Io { .. })
        ));
    }
}
