//! Durable key-value backends for carts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("cart storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Get/set primitive a [`super::CartStore`] persists through.
#[async_trait]
pub trait CartStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    /// Drops the record under `key`. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCartStorage {
    pub fn new() -> Self { Self::default() }
    pub async fn record_count(&self) -> usize { self.entries.read().await.len() }
}

#[async_trait]
impl CartStorage for MemoryCartStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    dir: PathBuf,
}

impl FileCartStorage {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key.chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' }).collect();
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl CartStorage for FileCartStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCartStorage::open(dir.path().join("carts")).await.unwrap();
        assert_eq!(storage.get("cart:abc").await.unwrap(), None);
        storage.set("cart:abc", "{\"version\":1}".into()).await.unwrap();
        assert_eq!(storage.get("cart:abc").await.unwrap().as_deref(), Some("{\"version\":1}"));
        assert!(dir.path().join("carts").join("cart_abc.json").exists());

        storage.remove("cart:abc").await.unwrap();
        storage.remove("cart:abc").await.unwrap();
        assert_eq!(storage.get("cart:abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_storage_overwrites() {
        let storage = MemoryCartStorage::new();
        storage.set("k", "a".into()).await.unwrap();
        storage.set("k", "b".into()).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("b"));
    }
}
