use crate::{conversation::Conversa, error::Result};
use sqlx::PgPool;
use uuid::Uuid;

use super::message_models::{Mensagem, TipoMensagem};

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the message and, in the same transaction, bumps the
    /// recipient's unread counter and refreshes the conversation preview and
    /// activity timestamp. Returns the message and the updated conversation.
    pub async fn create(
        &self,
        conversa_id: Uuid,
        remetente_id: Uuid,
        conteudo_cifrado: &[u8],
        preview_cifrado: &[u8],
        tipo: TipoMensagem,
    ) -> Result<(Mensagem, Conversa)> {
        let mut tx = self.pool.begin().await?;

        let mensagem = sqlx::query_as::<_, Mensagem>(
            "INSERT INTO mensagens (conversa_id, remetente_id, conteudo, tipo)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(conversa_id)
        .bind(remetente_id)
        .bind(conteudo_cifrado)
        .bind(tipo)
        .fetch_one(&mut *tx)
        .await?;

        let conversa = sqlx::query_as::<_, Conversa>(
            "UPDATE conversas SET
                unread_paciente = unread_paciente + CASE WHEN psicologo_id = $2 THEN 1 ELSE 0 END,
                unread_psicologo = unread_psicologo + CASE WHEN paciente_id = $2 THEN 1 ELSE 0 END,
                ultima_mensagem = $3,
                ultima_mensagem_em = $4,
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(conversa_id)
        .bind(remetente_id)
        .bind(preview_cifrado)
        .bind(mensagem.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((mensagem, conversa))
    }

    pub async fn find_by_id(&self, mensagem_id: Uuid) -> Result<Option<Mensagem>> {
        let mensagem = sqlx::query_as::<_, Mensagem>("SELECT * FROM mensagens WHERE id = $1")
            .bind(mensagem_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(mensagem)
    }

    /// Newest-first window over the conversation history. The store-assigned
    /// `created_at` order is the total order within a conversation, so a
    /// stable window never reorders on refetch.
    pub async fn find_by_conversation(
        &self,
        conversa_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Mensagem>> {
        let mensagens = sqlx::query_as::<_, Mensagem>(
            "SELECT * FROM mensagens
             WHERE conversa_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(conversa_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(mensagens)
    }

    pub async fn count_by_conversation(&self, conversa_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM mensagens WHERE conversa_id = $1")
                .bind(conversa_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// One-way unread→read transition. Returns `None` when nothing changed:
    /// already read, or the reader is the sender. Calling twice is a no-op,
    /// not an error, and `lida_em` keeps the first transition time.
    pub async fn mark_as_read(
        &self,
        mensagem_id: Uuid,
        reader_id: Uuid,
    ) -> Result<Option<Mensagem>> {
        let mensagem = sqlx::query_as::<_, Mensagem>(
            "UPDATE mensagens SET lida = true, lida_em = NOW()
             WHERE id = $1 AND remetente_id <> $2 AND lida = false
             RETURNING *",
        )
        .bind(mensagem_id)
        .bind(reader_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mensagem)
    }
}
