use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    conversation::{ConversationRepository, ConversationService},
    db::DbPool,
    message::{MensagemResponse, MessageService},
    presence::PresenceService,
    user::UserRepository,
    websocket::{ConnectionManager, SubscriptionDispatcher},
};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub message_tx: broadcast::Sender<(Uuid, MensagemResponse)>,
    pub ws_connections: ConnectionManager,
    pub dispatcher: SubscriptionDispatcher,
    pub presence: PresenceService,
    pub user_repository: UserRepository,
    pub conversation_repository: ConversationRepository,
    pub conversation_service: ConversationService,
    pub message_service: MessageService,
}

#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub redis_url: String,
    pub content_key: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            content_key: std::env::var("CONTENT_KEY")
                .expect("CONTENT_KEY must be set (64 hex chars)"),
        }
    }
}
