use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

/// As cinco famílias de erro expostas pela API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    PermissionDenied,
    InvalidArgument,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Usuário não encontrado ou inativo")]
    UserNotFound,

    #[error("Acesso restrito ao papel '{0}'")]
    PermissionDenied(&'static str),

    #[error("Tenant ID required")]
    TenantRequired,

    #[error("No fields to update")]
    NoFieldsToUpdate,

    #[error("Subdomain already exists: {0}")]
    SubdomainAlreadyExists(String),

    #[error("E-mail já existe: {0}")]
    EmailAlreadyExists(String),

    #[error("Conteúdo base64 inválido: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    // O &'static str identifica o recurso ("task", "document", ...)
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Erro de armazenamento: {0}")]
    StorageError(#[from] crate::storage::StorageError),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidToken | AppError::InvalidCredentials | AppError::UserNotFound => {
                ErrorKind::Unauthenticated
            }
            AppError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            AppError::ValidationError(_)
            | AppError::TenantRequired
            | AppError::NoFieldsToUpdate
            | AppError::SubdomainAlreadyExists(_)
            | AppError::EmailAlreadyExists(_)
            | AppError::InvalidBase64(_) => ErrorKind::InvalidArgument,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::StorageError(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ErrorKind::Internal,
        }
    }

    /// Chave da mensagem no catálogo de traduções.
    fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::InvalidToken => "invalid_token",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::UserNotFound => "user_not_found",
            AppError::PermissionDenied(_) => "permission_denied",
            AppError::TenantRequired => "tenant_required",
            AppError::NoFieldsToUpdate => "no_fields_to_update",
            AppError::SubdomainAlreadyExists(_) => "subdomain_exists",
            AppError::EmailAlreadyExists(_) => "email_exists",
            AppError::InvalidBase64(_) => "invalid_base64",
            AppError::NotFound(_) => "not_found",
            _ => "internal_error",
        }
    }

    fn message_params(&self) -> Vec<(&'static str, String)> {
        match self {
            AppError::PermissionDenied(role) => vec![("role", role.to_string())],
            AppError::SubdomainAlreadyExists(s) => vec![("subdomain", s.clone())],
            AppError::EmailAlreadyExists(e) => vec![("email", e.clone())],
            AppError::NotFound(resource) => vec![("resource", resource.to_string())],
            _ => Vec::new(),
        }
    }

    /// Converte o erro de domínio na resposta HTTP, já traduzida.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let kind = self.kind();

        if kind == ErrorKind::Internal {
            // O detalhe fica no log, o cliente recebe a mensagem genérica.
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let params = self.message_params();
        let error = i18n.translate(&locale.0, self.message_key(), &params);

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .map(Value::String)
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            _ => None,
        };

        ApiError {
            status: kind.status(),
            error,
            details,
        }
    }
}

/// O erro "pronto para o fio": status + mensagem localizada.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Caminho curto para quem não tem o Locale à mão (usa o idioma padrão).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(AppError::InvalidToken.kind().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::PermissionDenied("admin").kind().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::NoFieldsToUpdate.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            AppError::SubdomainAlreadyExists("joao".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(AppError::NotFound("document").kind(), ErrorKind::NotFound);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco vazou"));
        let api = err.to_api_error(&Locale("en".into()), &I18nStore::default());

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("senha"));
    }

    #[test]
    fn messages_follow_locale() {
        let i18n = I18nStore::default();
        let err = AppError::SubdomainAlreadyExists("maria2024".into());

        let pt = err.to_api_error(&Locale("pt".into()), &i18n);
        let en = err.to_api_error(&Locale("en".into()), &i18n);

        assert!(pt.error.contains("maria2024"));
        assert!(en.error.contains("maria2024"));
        assert_ne!(pt.error, en.error);
    }

    #[test]
    fn every_client_error_has_a_catalog_entry() {
        let i18n = I18nStore::default();
        let errors = [
            AppError::InvalidToken,
            AppError::InvalidCredentials,
            AppError::UserNotFound,
            AppError::PermissionDenied("admin"),
            AppError::TenantRequired,
            AppError::NoFieldsToUpdate,
            AppError::SubdomainAlreadyExists("x".into()),
            AppError::EmailAlreadyExists("x@y.z".into()),
            AppError::NotFound("task"),
        ];

        for err in errors {
            for lang in ["pt", "en"] {
                let key = err.message_key();
                assert_ne!(i18n.translate(lang, key, &[]), key, "{lang}/{key}");
            }
        }
    }
}
