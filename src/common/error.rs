use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::confirmation::ConfirmationStatus,
};

// Erros de negócio e de infraestrutura, todos tipados.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Confirmação {0} não encontrada")]
    ConfirmationNotFound(Uuid),

    #[error("Confirmação {id} já foi decidida ({status})")]
    NotPending { id: Uuid, status: ConfirmationStatus },

    #[error("O vendeur {vendeur_id} já possui uma confirmação pendente")]
    DuplicatePending { vendeur_id: Uuid },

    #[error("Acesso negado: {0}")]
    Unauthorized(String),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Já existe um produto com a referência '{0}'")]
    ProduitReferenceAlreadyExists(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// ---
// Erro de fronteira HTTP (já traduzido)
// ---
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    /// Converte o erro de domínio num `ApiError` no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let t = |key: &str| i18n.translate(lang, key);

        let (status, error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                (StatusCode::BAD_REQUEST, t("error.validation"), Some(json!(details)))
            }
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, t("error.email_exists"), None),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, t("error.invalid_credentials"), None)
            }
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, t("error.invalid_token"), None),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, t("error.user_not_found"), None),
            AppError::ConfirmationNotFound(id) => (
                StatusCode::NOT_FOUND,
                t("error.confirmation_not_found"),
                Some(json!({ "confirmationId": id })),
            ),
            AppError::NotPending { id, status } => (
                StatusCode::CONFLICT,
                t("error.not_pending"),
                Some(json!({ "confirmationId": id, "status": status })),
            ),
            AppError::DuplicatePending { vendeur_id } => (
                StatusCode::CONFLICT,
                t("error.duplicate_pending"),
                Some(json!({ "vendeurId": vendeur_id })),
            ),
            AppError::Unauthorized(reason) => (
                StatusCode::FORBIDDEN,
                t("error.unauthorized"),
                Some(json!({ "reason": reason })),
            ),
            AppError::ResourceNotFound(what) => (
                StatusCode::NOT_FOUND,
                t("error.resource_not_found"),
                Some(json!({ "resource": what })),
            ),
            AppError::ProduitReferenceAlreadyExists(reference) => (
                StatusCode::CONFLICT,
                t("error.produit_reference_exists"),
                Some(json!({ "reference": reference })),
            ),

            // Todo o resto é infraestrutura: 500 e log detalhado.
            e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, t("error.internal"), None)
            }
        };

        ApiError { status, error, details }
    }
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
