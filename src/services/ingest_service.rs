// src/services/ingest_service.rs

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    events::{DataUploaded, EventBus},
    models::electoral::{DataType, UploadFilePayload, UploadResponse},
    storage::{object_key, ObjectStore},
};

/// Recebe os arquivos de dados, grava no bucket de uploads e avisa o worker.
#[derive(Clone)]
pub struct IngestService {
    uploads: Arc<dyn ObjectStore>,
    bus: EventBus,
}

fn content_type_for(file_name: &str) -> &'static str {
    if file_name.to_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "text/csv"
    }
}

impl IngestService {
    pub fn new(uploads: Arc<dyn ObjectStore>, bus: EventBus) -> Self {
        Self { uploads, bus }
    }

    /// Falhas de decodificação ou de gravação viram `success: false` na resposta,
    /// nunca erro de protocolo.
    pub async fn upload(
        &self,
        tenant_id: Uuid,
        uploaded_by: &str,
        data_type: DataType,
        payload: UploadFilePayload,
    ) -> UploadResponse {
        match self.store(tenant_id, uploaded_by, data_type, payload).await {
            Ok(file_path) => UploadResponse {
                success: true,
                message: data_type.upload_message().to_string(),
                file_path,
            },
            Err(e) => {
                tracing::warn!(tenant_id = %tenant_id, data_type = %data_type, "upload recusado: {}", e);
                UploadResponse {
                    success: false,
                    message: format!("Upload failed: {}", e),
                    file_path: String::new(),
                }
            }
        }
    }

    async fn store(
        &self,
        tenant_id: Uuid,
        uploaded_by: &str,
        data_type: DataType,
        payload: UploadFilePayload,
    ) -> Result<String, AppError> {
        let bytes = STANDARD.decode(payload.file_data.trim())?;
        let file_path = object_key(data_type.as_str(), tenant_id, &payload.file_name);

        self.uploads
            .put(&file_path, bytes, content_type_for(&payload.file_name))
            .await?;

        let event_id = self.bus.data_uploaded().publish(DataUploaded {
            tenant_id,
            data_type,
            file_name: payload.file_name,
            file_path: file_path.clone(),
            uploaded_by: uploaded_by.to_string(),
        });

        tracing::info!(tenant_id = %tenant_id, event_id = %event_id, file = %file_path, "📤 Arquivo recebido");
        Ok(file_path)
    }
}
