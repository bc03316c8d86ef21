use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use futures::Stream;
use serde::Deserialize;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use uuid::Uuid;

use crate::{
    error::{ApiResposta, Result},
    middleware::AuthUser,
    state::AppState,
};

use super::message_dto::{EnviarMensagemRequest, PaginatedResponse};
use super::message_models::MensagemResponse;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

/// Send a message in a conversation
#[utoipa::path(
    post,
    path = "/api/conversas/{id}/mensagens",
    tag = "mensagens",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    request_body = EnviarMensagemRequest,
    responses(
        (status = 201, description = "Message persisted and broadcast", body = MensagemResponse),
        (status = 400, description = "Empty or oversized content, or inactive conversation"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a participant"),
        (status = 404, description = "Conversation not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversa_id): Path<Uuid>,
    Json(payload): Json<EnviarMensagemRequest>,
) -> Result<impl IntoResponse> {
    let mensagem = state
        .message_service
        .send_message(user_id, conversa_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResposta::ok(mensagem))))
}

/// Paginated conversation history.
///
/// Page 1 holds the newest messages; higher pages walk backwards in time.
/// Within each response messages are ordered oldest-to-newest, ready to
/// render top-down.
#[utoipa::path(
    get,
    path = "/api/conversas/{id}/mensagens",
    tag = "mensagens",
    params(
        ("id" = Uuid, Path, description = "Conversation ID"),
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 50)")
    ),
    responses(
        (status = 200, description = "Paginated messages, decrypted for the caller", body = PaginatedResponse<MensagemResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a participant"),
        (status = 404, description = "Conversation not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversa_id): Path<Uuid>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = ((page - 1) * limit) as i64;

    let (mensagens, total) = state
        .message_service
        .get_history(user_id, conversa_id, limit as i64, offset)
        .await?;

    let total_pages = ((total as f64) / (limit as f64)).ceil() as u32;

    let response = PaginatedResponse {
        data: mensagens,
        total,
        page,
        limit,
        total_pages,
    };

    Ok((StatusCode::OK, Json(ApiResposta::ok(response))))
}

/// Mark a message as read
#[utoipa::path(
    patch,
    path = "/api/mensagens/{id}/read",
    tag = "mensagens",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Message read (idempotent)"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a participant"),
        (status = 404, description = "Message not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_message_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(mensagem_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.message_service.mark_read(user_id, mensagem_id).await?;

    Ok((StatusCode::OK, Json(ApiResposta::vazia())))
}

/// SSE feed of messages addressed to the caller, for clients that cannot
/// hold a WebSocket open. New messages only; history is fetched separately.
#[utoipa::path(
    get,
    path = "/api/mensagens/stream",
    tag = "mensagens",
    responses(
        (status = 200, description = "Server-sent event stream of incoming messages"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn message_stream(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Sse<impl Stream<Item = std::result::Result<Event, std::convert::Infallible>>> {
    let rx = state.message_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok((destinatario_id, mensagem)) if destinatario_id == user_id => {
            let json = serde_json::to_string(&mensagem).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
