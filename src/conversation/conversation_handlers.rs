use axum::{extract::Path, extract::State, http::StatusCode, response::IntoResponse, Json};
use uuid::Uuid;

use crate::{
    error::{ApiResposta, Result},
    middleware::AuthUser,
    state::AppState,
};

use super::conversation_dto::{ConversaResumo, CriarConversaRequest};
use super::conversation_models::ConversaResponse;

/// Find or create the conversation between a patient and a psychologist
#[utoipa::path(
    post,
    path = "/api/conversas",
    tag = "conversas",
    request_body = CriarConversaRequest,
    responses(
        (status = 200, description = "Existing or newly created conversation", body = ConversaResponse),
        (status = 400, description = "Unknown participant or role mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not part of the pair")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn find_or_create_conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CriarConversaRequest>,
) -> Result<impl IntoResponse> {
    let conversa = state
        .conversation_service
        .find_or_create(user_id, payload.paciente_id, payload.psicologo_id)
        .await?;

    Ok((StatusCode::OK, Json(ApiResposta::ok(conversa))))
}

/// List the caller's conversations, most recent activity first
#[utoipa::path(
    get,
    path = "/api/conversas",
    tag = "conversas",
    responses(
        (status = 200, description = "Conversation summaries with counterpart profile and unread count", body = Vec<ConversaResumo>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_conversations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let conversas = state.conversation_service.list(user_id).await?;

    Ok((StatusCode::OK, Json(ApiResposta::ok(conversas))))
}

/// Reset the caller's unread counter and mark the counterpart's messages read
#[utoipa::path(
    patch,
    path = "/api/conversas/{id}/read",
    tag = "conversas",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Updated conversation", body = ConversaResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a participant"),
        (status = 404, description = "Conversation not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_conversation_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversa_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let conversa = state
        .conversation_service
        .mark_read(user_id, conversa_id)
        .await?;

    Ok((StatusCode::OK, Json(ApiResposta::ok(conversa))))
}
