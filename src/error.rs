use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Não autenticado")]
    NotAuthenticated,

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Conversa não encontrada")]
    ConversationNotFound,

    #[error("{0}")]
    NotFound(String),

    #[error("Serviço de dados indisponível")]
    StoreUnavailable(#[from] sqlx::Error),

    #[error("Registro inválido no armazenamento: {0}")]
    Decode(String),
}

impl AppError {
    pub fn codigo(&self) -> &'static str {
        match self {
            AppError::NotAuthenticated => "NOT_AUTHENTICATED",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::ConversationNotFound => "CONVERSATION_NOT_FOUND",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::Decode(_) => "DECODE_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::ConversationNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Postgres unique-constraint violation (SQLSTATE 23505). The concurrent
/// find-or-create race is resolved by retrying the lookup when this matches.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Uniform response envelope. Callers inspect `sucesso` instead of catching;
/// `codigo` carries the machine-readable error kind.
#[derive(Debug, Serialize)]
pub struct ApiResposta<T> {
    pub sucesso: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dados: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo: Option<String>,
}

impl<T: Serialize> ApiResposta<T> {
    pub fn ok(dados: T) -> Self {
        Self {
            sucesso: true,
            dados: Some(dados),
            erro: None,
            codigo: None,
        }
    }
}

impl ApiResposta<()> {
    /// Success with no payload (e.g. idempotent mark-read).
    pub fn vazia() -> Self {
        Self {
            sucesso: true,
            dados: None,
            erro: None,
            codigo: None,
        }
    }

    pub fn falha(erro: String, codigo: &str) -> Self {
        Self {
            sucesso: false,
            dados: None,
            erro: Some(erro),
            codigo: Some(codigo.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
        }

        let body = ApiResposta::falha(self.to_string(), self.codigo());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::NotAuthenticated.codigo(), "NOT_AUTHENTICATED");
        assert_eq!(
            AppError::PermissionDenied("x".into()).codigo(),
            "PERMISSION_DENIED"
        );
        assert_eq!(AppError::InvalidInput("x".into()).codigo(), "INVALID_INPUT");
        assert_eq!(
            AppError::ConversationNotFound.codigo(),
            "CONVERSATION_NOT_FOUND"
        );
        assert_eq!(
            AppError::StoreUnavailable(sqlx::Error::PoolClosed).codigo(),
            "STORE_UNAVAILABLE"
        );
    }

    #[test]
    fn test_envelope_success_shape() {
        let resposta = ApiResposta::ok(42);
        let json = serde_json::to_value(&resposta).unwrap();
        assert_eq!(json["sucesso"], true);
        assert_eq!(json["dados"], 42);
        assert!(json.get("erro").is_none());
        assert!(json.get("codigo").is_none());
    }

    #[test]
    fn test_envelope_failure_shape() {
        let resposta = ApiResposta::falha("Conversa não encontrada".into(), "CONVERSATION_NOT_FOUND");
        let json = serde_json::to_value(&resposta).unwrap();
        assert_eq!(json["sucesso"], false);
        assert_eq!(json["codigo"], "CONVERSATION_NOT_FOUND");
        assert!(json.get("dados").is_none());
    }
}
