// src/storage.rs

pub mod local;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("chave de objeto inválida: {0}")]
    InvalidKey(String),

    #[error("objeto já existe: {0}")]
    AlreadyExists(String),

    #[error("objeto não encontrado: {0}")]
    NotFound(String),

    #[error("falha de E/S no armazenamento: {0}")]
    Io(#[from] std::io::Error),
}

/// Gateway de armazenamento de objetos por caminho.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Grava um objeto novo. Nunca sobrescreve.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Remove o objeto. Chave inexistente não é erro.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Os dois buckets do sistema: uploads de ingestão e o cofre de documentos.
#[derive(Clone)]
pub struct Buckets {
    pub uploads: Arc<dyn ObjectStore>,
    pub vault: Arc<dyn ObjectStore>,
}

impl Buckets {
    pub fn local(root: &std::path::Path) -> Self {
        Self {
            uploads: Arc::new(LocalObjectStore::new(root.join("uploads"))),
            vault: Arc::new(LocalObjectStore::new(root.join("vault"))),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            uploads: Arc::new(MemoryObjectStore::default()),
            vault: Arc::new(MemoryObjectStore::default()),
        }
    }
}

/// Remove separadores de caminho e sequências `..` do nome enviado pelo cliente.
pub fn safe_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = base.replace("..", "").trim().to_string();

    if cleaned.is_empty() || cleaned == "." {
        "file".to_string()
    } else {
        cleaned
    }
}

/// `{prefix}/{owner}/{millis}_{sufixo}_{nome}`: o sufixo aleatório evita colisão
/// entre dois uploads do mesmo arquivo no mesmo milissegundo.
pub fn object_key(prefix: &str, owner: Uuid, file_name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}/{}_{}_{}",
        prefix,
        owner,
        Utc::now().timestamp_millis(),
        &suffix[..8],
        safe_file_name(file_name)
    )
}

/// Rejeita chaves absolutas, vazias ou que tentem sair da raiz do bucket.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.starts_with('\\')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");

    if invalid {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}
