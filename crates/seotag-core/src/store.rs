//! Local upload store.
//!
//! Saves uploaded images into a single directory and deletes them on request.
//! The tagging core never touches the store; it only sees decoded images.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Directory-backed store for uploaded images.
pub struct ImageStore {
    upload_dir: PathBuf,
}

impl ImageStore {
    /// Create a store rooted at `upload_dir`. The directory is created lazily.
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Save `bytes` under `name` and return the stored path.
    ///
    /// Only the file-name component of `name` is used, so an upload named
    /// `../../etc/passwd` lands in the upload directory as `passwd`. An
    /// existing file with the same name is overwritten.
    pub fn save(&self, bytes: &[u8], name: &str) -> Result<PathBuf, StoreError> {
        let file_name = Path::new(name)
            .file_name()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| StoreError::InvalidName(name.to_string()))?;

        std::fs::create_dir_all(&self.upload_dir).map_err(|source| StoreError::Io {
            path: self.upload_dir.clone(),
            source,
        })?;

        let path = self.upload_dir.join(file_name);
        std::fs::write(&path, bytes).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!("Image saved at {:?} ({} bytes)", path, bytes.len());
        Ok(path)
    }

    /// Resolve a stored upload by name.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        Path::new(name)
            .file_name()
            .map(|n| self.upload_dir.join(n))
            .ok_or_else(|| StoreError::InvalidName(name.to_string()))
    }

    /// Delete a stored file.
    pub fn delete(&self, path: &Path) -> Result<(), StoreError> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                tracing::info!("Image deleted: {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.to_path_buf()))
            }
            Err(source) => Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("upload_images"));
        let path = store.save(b"bytes", "beach.jpg").unwrap();
        assert_eq!(path, dir.path().join("upload_images").join("beach.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
    }

    #[test]
    fn test_save_strips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let path = store.save(b"x", "../../escape.png").unwrap();
        assert_eq!(path, dir.path().join("escape.png"));
    }

    #[test]
    fn test_save_rejects_nameless_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        assert!(matches!(
            store.save(b"x", ".."),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn test_delete_twice_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let path = store.save(b"x", "cat.png").unwrap();

        store.delete(&path).unwrap();
        assert!(!path.exists());
        assert!(matches!(store.delete(&path), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_path_for() {
        let store = ImageStore::new("/srv/uploads");
        assert_eq!(
            store.path_for("a/b/cat.png").unwrap(),
            PathBuf::from("/srv/uploads/cat.png")
        );
    }
}
