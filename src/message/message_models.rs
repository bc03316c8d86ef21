use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TipoMensagem {
    Text,
    Image,
    File,
}

impl std::fmt::Display for TipoMensagem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TipoMensagem::Text => write!(f, "text"),
            TipoMensagem::Image => write!(f, "image"),
            TipoMensagem::File => write!(f, "file"),
        }
    }
}

/// Message row as stored: `conteudo` is ciphertext. Immutable after insert
/// except the one-way `lida`/`lida_em` transition.
#[derive(Debug, Clone, FromRow)]
pub struct Mensagem {
    pub id: Uuid,
    pub conversa_id: Uuid,
    pub remetente_id: Uuid,
    pub conteudo: Vec<u8>,
    pub tipo: TipoMensagem,
    pub lida: bool,
    pub lida_em: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Message as served to an authorized participant, content decrypted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MensagemResponse {
    pub id: Uuid,
    pub conversa_id: Uuid,
    pub remetente_id: Uuid,
    pub conteudo: String,
    pub tipo: TipoMensagem,
    pub lida: bool,
    pub lida_em: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MensagemResponse {
    pub fn from_decrypted(mensagem: Mensagem, conteudo: String) -> Self {
        Self {
            id: mensagem.id,
            conversa_id: mensagem.conversa_id,
            remetente_id: mensagem.remetente_id,
            conteudo,
            tipo: mensagem.tipo,
            lida: mensagem.lida,
            lida_em: mensagem.lida_em,
            created_at: mensagem.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tipo_display() {
        assert_eq!(TipoMensagem::Text.to_string(), "text");
        assert_eq!(TipoMensagem::Image.to_string(), "image");
        assert_eq!(TipoMensagem::File.to_string(), "file");
    }

    #[test]
    fn test_tipo_serde_lowercase() {
        assert_eq!(serde_json::to_string(&TipoMensagem::File).unwrap(), "\"file\"");
        let t: TipoMensagem = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(t, TipoMensagem::Image);
    }
}
