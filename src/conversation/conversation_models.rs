use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Conversation row as stored. `ultima_mensagem` is the encrypted preview of
/// the last message, so this type is never serialized directly; responses go
/// through [`ConversaResponse`] after decryption.
#[derive(Debug, Clone, FromRow)]
pub struct Conversa {
    pub id: Uuid,
    pub paciente_id: Uuid,
    pub psicologo_id: Uuid,
    pub ativa: bool,
    pub unread_paciente: i32,
    pub unread_psicologo: i32,
    pub ultima_mensagem: Option<Vec<u8>>,
    pub ultima_mensagem_em: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversa {
    pub fn participante(&self, user_id: Uuid) -> bool {
        self.paciente_id == user_id || self.psicologo_id == user_id
    }

    /// The other side of the conversation. Callers must have checked
    /// `participante` first; for a non-participant this returns the patient.
    pub fn contraparte(&self, user_id: Uuid) -> Uuid {
        if self.paciente_id == user_id {
            self.psicologo_id
        } else {
            self.paciente_id
        }
    }

    pub fn unread_de(&self, user_id: Uuid) -> i32 {
        if self.paciente_id == user_id {
            self.unread_paciente
        } else {
            self.unread_psicologo
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversaResponse {
    pub id: Uuid,
    pub paciente_id: Uuid,
    pub psicologo_id: Uuid,
    pub ativa: bool,
    pub unread_paciente: i32,
    pub unread_psicologo: i32,
    pub ultima_mensagem: Option<String>,
    pub ultima_mensagem_em: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversaResponse {
    pub fn from_decrypted(conversa: Conversa, ultima_mensagem: Option<String>) -> Self {
        Self {
            id: conversa.id,
            paciente_id: conversa.paciente_id,
            psicologo_id: conversa.psicologo_id,
            ativa: conversa.ativa,
            unread_paciente: conversa.unread_paciente,
            unread_psicologo: conversa.unread_psicologo,
            ultima_mensagem,
            ultima_mensagem_em: conversa.ultima_mensagem_em,
            created_at: conversa.created_at,
            updated_at: conversa.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversa(paciente: Uuid, psicologo: Uuid) -> Conversa {
        Conversa {
            id: Uuid::new_v4(),
            paciente_id: paciente,
            psicologo_id: psicologo,
            ativa: true,
            unread_paciente: 2,
            unread_psicologo: 0,
            ultima_mensagem: None,
            ultima_mensagem_em: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_participante_e_contraparte() {
        let p = Uuid::new_v4();
        let q = Uuid::new_v4();
        let c = conversa(p, q);

        assert!(c.participante(p));
        assert!(c.participante(q));
        assert!(!c.participante(Uuid::new_v4()));
        assert_eq!(c.contraparte(p), q);
        assert_eq!(c.contraparte(q), p);
    }

    #[test]
    fn test_unread_por_lado() {
        let p = Uuid::new_v4();
        let q = Uuid::new_v4();
        let c = conversa(p, q);

        assert_eq!(c.unread_de(p), 2);
        assert_eq!(c.unread_de(q), 0);
    }
}
