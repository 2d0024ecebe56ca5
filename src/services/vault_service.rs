// src/services/vault_service.rs

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DocumentStore,
    models::vault::{Document, DownloadDocumentResponse, NewDocument, UploadDocumentPayload},
    storage::{object_key, ObjectStore},
};

/// Cofre de documentos: conteúdo no bucket, metadados no banco.
#[derive(Clone)]
pub struct VaultService {
    documents: Arc<dyn DocumentStore>,
    vault: Arc<dyn ObjectStore>,
}

impl VaultService {
    pub fn new(documents: Arc<dyn DocumentStore>, vault: Arc<dyn ObjectStore>) -> Self {
        Self { documents, vault }
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<Document>, AppError> {
        self.documents.list(tenant_id).await
    }

    /// Objeto primeiro, linha depois: nunca existe metadado apontando para o vazio.
    pub async fn upload(
        &self,
        tenant_id: Uuid,
        uploaded_by: &str,
        payload: UploadDocumentPayload,
    ) -> Result<Document, AppError> {
        let bytes = STANDARD.decode(payload.file_data.trim())?;
        let size_bytes = bytes.len() as i64;
        let file_path = object_key("vault", tenant_id, &payload.name);

        self.vault.put(&file_path, bytes, &payload.content_type).await?;

        let created = self
            .documents
            .create(NewDocument {
                id: Uuid::new_v4(),
                tenant_id,
                name: payload.name,
                content_type: payload.content_type,
                size_bytes,
                file_path: file_path.clone(),
                tags: payload.tags,
                uploaded_by: uploaded_by.to_string(),
            })
            .await;

        // Sem linha, o objeto não tem dono: remove antes de devolver o erro
        let document = match created {
            Ok(document) => document,
            Err(e) => {
                if let Err(cleanup) = self.vault.delete(&file_path).await {
                    tracing::warn!(key = %file_path, "não foi possível remover o objeto órfão: {}", cleanup);
                }
                return Err(e);
            }
        };

        tracing::info!(tenant_id = %tenant_id, document_id = %document.id, size_bytes, "🗄️ Documento guardado no cofre");
        Ok(document)
    }

    pub async fn download(&self, tenant_id: Uuid, id: Uuid) -> Result<DownloadDocumentResponse, AppError> {
        let document = self
            .documents
            .find(tenant_id, id)
            .await?
            .ok_or(AppError::NotFound("document"))?;

        let bytes = self.vault.get(&document.file_path).await?;

        Ok(DownloadDocumentResponse {
            file_name: document.name,
            file_data: STANDARD.encode(bytes),
        })
    }
}
