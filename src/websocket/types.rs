use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::conversation::ConversaResponse;
use crate::message::{MensagemResponse, TipoMensagem};
use crate::presence::PresenceRecord;

/// Server-to-client frames. The same shape travels the per-conversation
/// change feed, so every variant round-trips through serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    NewMessage(MensagemResponse),
    ConversationUpdated(ConversaResponse),
    MessageRead(MessageReadPayload),
    Presence(PresencePayload),
    Error(ErrorPayload),
    Ping,
    Pong,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageReadPayload {
    pub mensagem_id: Uuid,
    pub conversa_id: Uuid,
    pub lida_em: DateTime<Utc>,
}

/// Full presence snapshot for one conversation channel, not a delta. Each
/// user maps to the records of their live sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresencePayload {
    pub conversa_id: Uuid,
    pub estados: HashMap<Uuid, Vec<PresenceRecord>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub erro: String,
    pub codigo: String,
}

// Client-to-server messages
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe {
        conversa_id: Uuid,
    },
    Unsubscribe {
        conversa_id: Uuid,
    },
    SetPresence {
        conversa_id: Uuid,
        online: bool,
        typing: bool,
    },
    SendMessage {
        conversa_id: Uuid,
        conteudo: String,
        tipo: Option<TipoMensagem>,
    },
    MarkRead {
        conversa_id: Uuid,
    },
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_message_tagged_roundtrip() {
        let payload = WsMessage::MessageRead(MessageReadPayload {
            mensagem_id: Uuid::new_v4(),
            conversa_id: Uuid::new_v4(),
            lida_em: Utc::now(),
        });

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"type\":\"message_read\""));

        let back: WsMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, WsMessage::MessageRead(_)));
    }

    #[test]
    fn test_client_message_parse() {
        let conversa_id = Uuid::new_v4();
        let json = format!(
            "{{\"type\":\"set_presence\",\"conversa_id\":\"{}\",\"online\":true,\"typing\":false}}",
            conversa_id
        );
        let msg: ClientMessage = serde_json::from_str(&json).unwrap();
        match msg {
            ClientMessage::SetPresence {
                conversa_id: id,
                online,
                typing,
            } => {
                assert_eq!(id, conversa_id);
                assert!(online);
                assert!(!typing);
            }
            other => panic!("variante inesperada: {:?}", other),
        }
    }

    #[test]
    fn test_client_message_unknown_type_rejected() {
        let parsed = serde_json::from_str::<ClientMessage>("{\"type\":\"call_offer\"}");
        assert!(parsed.is_err());
    }
}
