use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    message::message_dto::EnviarMensagemRequest,
    middleware::AuthUser,
    state::AppState,
    websocket::types::{ClientMessage, ErrorPayload, WsMessage},
};

use super::connection::WsSender;

/// Realtime subscription socket.
///
/// Carries conversation subscriptions, presence updates and message frames.
/// Subscribing delivers new events only; history is fetched separately, and
/// after a reconnect the client reconciles the gap via the history endpoint.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, user_id: Uuid, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    state.ws_connections.add_connection(user_id, tx.clone());

    // Task: send messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Task: receive messages from WebSocket
    let state_clone = state.clone();
    let tx_clone = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Err(e) =
                    process_client_message(&text, user_id, &state_clone, &tx_clone).await
                {
                    tracing::error!("erro ao processar frame do usuário {}: {:?}", user_id, e);
                    let _ = tx_clone.send(WsMessage::Error(ErrorPayload {
                        erro: e.to_string(),
                        codigo: e.codigo().to_string(),
                    }));
                }
            } else if let Message::Close(_) = msg {
                break;
            }
        }
    });

    // Heartbeat task
    let tx_heartbeat = tx.clone();
    let mut heartbeat_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        loop {
            interval.tick().await;
            if tx_heartbeat.send(WsMessage::Ping).is_err() {
                break;
            }
        }
    });

    // Stop all tasks when any one finishes
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            heartbeat_task.abort();
        },
        _ = &mut recv_task => {
            send_task.abort();
            heartbeat_task.abort();
        },
        _ = &mut heartbeat_task => {
            send_task.abort();
            recv_task.abort();
        }
    }

    // Tear-down on every exit path: subscriptions and presence die with the
    // session, and each left channel gets a fresh snapshot.
    for conversa_id in state.dispatcher.unsubscribe_all(user_id) {
        state.presence.clear(conversa_id, user_id).await;
    }
    state.ws_connections.remove_connection(&user_id);

    tracing::info!("WebSocket encerrado para o usuário {}", user_id);
}

async fn process_client_message(
    text: &str,
    user_id: Uuid,
    state: &AppState,
    tx: &WsSender,
) -> Result<()> {
    let client_msg: ClientMessage = serde_json::from_str(text)
        .map_err(|e| AppError::InvalidInput(format!("Formato de mensagem inválido: {}", e)))?;

    match client_msg {
        ClientMessage::Subscribe { conversa_id } => {
            let conversa = state
                .conversation_repository
                .find_by_id(conversa_id)
                .await?
                .ok_or(AppError::ConversationNotFound)?;

            if !conversa.participante(user_id) {
                return Err(AppError::PermissionDenied(
                    "Você não participa desta conversa".to_string(),
                ));
            }

            // A second subscribe for the same pair is a no-op, so events are
            // never delivered twice to one socket.
            if state.dispatcher.subscribe(conversa_id, user_id) {
                state
                    .presence
                    .set_presence(conversa_id, user_id, true, false)
                    .await;
            }
        }

        ClientMessage::Unsubscribe { conversa_id } => {
            if state.dispatcher.unsubscribe(conversa_id, user_id) {
                state.presence.clear(conversa_id, user_id).await;
            }
        }

        ClientMessage::SetPresence {
            conversa_id,
            online,
            typing,
        } => {
            // Presence requires an active subscription; stray frames after
            // an unsubscribe are ignored.
            if state.dispatcher.is_subscribed(conversa_id, user_id) {
                state
                    .presence
                    .set_presence(conversa_id, user_id, online, typing)
                    .await;
            }
        }

        ClientMessage::SendMessage {
            conversa_id,
            conteudo,
            tipo,
        } => {
            state
                .message_service
                .send_message(user_id, conversa_id, EnviarMensagemRequest { conteudo, tipo })
                .await?;
        }

        ClientMessage::MarkRead { conversa_id } => {
            state
                .conversation_service
                .mark_read(user_id, conversa_id)
                .await?;
        }

        ClientMessage::Ping => {
            let _ = tx.send(WsMessage::Pong);
        }
    }

    Ok(())
}
