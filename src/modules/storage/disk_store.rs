use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};

/// A file written to the uploads directory
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Generated on-disk filename (uuid + original extension)
    pub stored_name: String,
    /// Full path to the stored file
    pub path: String,
}

/// Local-disk store for uploaded spreadsheets.
///
/// Files are written under a configurable uploads directory with a
/// uuid-based name so concurrent uploads of the same filename never collide.
/// Writes and deletes are synchronous relative to the request that triggers
/// them; there is no background queue.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let root = PathBuf::from(&config.upload_dir);

        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create upload directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write file bytes to disk, returning the generated name and path.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<StoredFile> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();

        let stored_name = format!("{}{}", Uuid::new_v4(), extension);
        let path = self.root.join(&stored_name);

        fs::write(&path, data).await.map_err(|e| {
            tracing::error!("Failed to write upload to {}: {}", path.display(), e);
            AppError::Internal("Failed to store uploaded file".to_string())
        })?;

        Ok(StoredFile {
            stored_name,
            path: path.to_string_lossy().into_owned(),
        })
    }

    /// Remove a stored file. A missing file is not an error.
    pub async fn delete(&self, path: &str) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                tracing::error!("Failed to delete stored file {}: {}", path, e);
                Err(AppError::Internal(
                    "Failed to delete stored file".to_string(),
                ))
            }
        }
    }

    pub async fn exists(&self, path: &str) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &Path) -> StorageConfig {
        StorageConfig {
            upload_dir: dir.to_string_lossy().into_owned(),
        }
    }

    #[tokio::test]
    async fn test_save_keeps_extension_and_generates_unique_names() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let storage = DiskStorage::new(&test_config(tmp.path())).await.unwrap();

        let a = storage.save("report.XLSX", b"one").await.unwrap();
        let b = storage.save("report.XLSX", b"two").await.unwrap();

        assert!(a.stored_name.ends_with(".xlsx"));
        assert_ne!(a.stored_name, b.stored_name);
        assert!(storage.exists(&a.path).await);
        assert_eq!(fs::read(&b.path).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let storage = DiskStorage::new(&test_config(tmp.path())).await.unwrap();

        let stored = storage.save("data.csv", b"a,b").await.unwrap();
        storage.delete(&stored.path).await.unwrap();
        assert!(!storage.exists(&stored.path).await);

        // Second delete of the same path succeeds
        storage.delete(&stored.path).await.unwrap();
    }
}
