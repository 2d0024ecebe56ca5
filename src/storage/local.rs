// src/storage/local.rs

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt};

use super::{validate_key, ObjectStore, StorageError};

/// Bucket em disco: cada chave vira um arquivo sob `root`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // create_new: falha se o arquivo já existir (upsert = false)
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(key.to_string()),
                _ => StorageError::Io(e),
            })?;

        file.write_all(&bytes).await?;
        file.flush().await?;

        tracing::debug!(key, content_type, size = bytes.len(), "objeto gravado");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;

        fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::Io(e),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key, "objeto removido");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_returns_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let bytes = vec![0u8, 159, 146, 150, 10, 13];

        store
            .put("vault/t1/123_doc.bin", bytes.clone(), "application/octet-stream")
            .await
            .unwrap();

        assert_eq!(store.get("vault/t1/123_doc.bin").await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put("a/b.csv", b"um".to_vec(), "text/csv").await.unwrap();
        let second = store.put("a/b.csv", b"dois".to_vec(), "text/csv").await;

        assert!(matches!(second, Err(StorageError::AlreadyExists(_))));
        assert_eq!(store.get("a/b.csv").await.unwrap(), b"um".to_vec());
    }

    #[tokio::test]
    async fn missing_and_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        assert!(matches!(store.get("nao/existe").await, Err(StorageError::NotFound(_))));
        assert!(matches!(
            store.put("../fora.txt", vec![1], "text/plain").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put("plans/t/plano.pdf", vec![1, 2], "application/pdf").await.unwrap();
        store.delete("plans/t/plano.pdf").await.unwrap();

        assert!(matches!(store.get("plans/t/plano.pdf").await, Err(StorageError::NotFound(_))));
        assert!(store.delete("plans/t/plano.pdf").await.is_ok());
        assert!(matches!(store.delete("../fora").await, Err(StorageError::InvalidKey(_))));
    }
}
