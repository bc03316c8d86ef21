use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CriarConversaRequest {
    pub paciente_id: Uuid,
    pub psicologo_id: Uuid,
}

/// Row shape of the conversation-list query: the caller's conversations with
/// the counterpart's profile denormalized in and the caller-side unread count
/// already selected. Preview still encrypted at this point.
#[derive(Debug, sqlx::FromRow)]
pub struct ConversaResumoRow {
    pub id: Uuid,
    pub contato_id: Uuid,
    pub contato_nome: String,
    pub contato_foto: Option<String>,
    pub unread_count: i32,
    pub ultima_mensagem: Option<Vec<u8>>,
    pub ultima_mensagem_em: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversaResumo {
    pub id: Uuid,
    pub contato_id: Uuid,
    pub contato_nome: String,
    pub contato_foto: Option<String>,
    pub unread_count: i32,
    pub ultima_mensagem: Option<String>,
    pub ultima_mensagem_em: Option<DateTime<Utc>>,
}

impl ConversaResumo {
    pub fn from_decrypted(row: ConversaResumoRow, ultima_mensagem: Option<String>) -> Self {
        Self {
            id: row.id,
            contato_id: row.contato_id,
            contato_nome: row.contato_nome,
            contato_foto: row.contato_foto,
            unread_count: row.unread_count,
            ultima_mensagem,
            ultima_mensagem_em: row.ultima_mensagem_em,
        }
    }
}
