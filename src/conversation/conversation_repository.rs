use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;

use super::conversation_dto::ConversaResumoRow;
use super::conversation_models::Conversa;

#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, conversa_id: Uuid) -> Result<Option<Conversa>> {
        let conversa = sqlx::query_as::<_, Conversa>("SELECT * FROM conversas WHERE id = $1")
            .bind(conversa_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(conversa)
    }

    pub async fn find_by_pair(
        &self,
        paciente_id: Uuid,
        psicologo_id: Uuid,
    ) -> Result<Option<Conversa>> {
        let conversa = sqlx::query_as::<_, Conversa>(
            "SELECT * FROM conversas
             WHERE paciente_id = $1 AND psicologo_id = $2 AND ativa = true",
        )
        .bind(paciente_id)
        .bind(psicologo_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversa)
    }

    /// Insert relies on the partial unique index over the active pair;
    /// concurrent creates surface as 23505 and the caller retries the lookup.
    pub async fn create(&self, paciente_id: Uuid, psicologo_id: Uuid) -> Result<Conversa> {
        let conversa = sqlx::query_as::<_, Conversa>(
            "INSERT INTO conversas (paciente_id, psicologo_id)
             VALUES ($1, $2)
             RETURNING *",
        )
        .bind(paciente_id)
        .bind(psicologo_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(conversa)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ConversaResumoRow>> {
        let conversas = sqlx::query_as::<_, ConversaResumoRow>(
            "SELECT c.id,
                    CASE WHEN c.paciente_id = $1 THEN c.psicologo_id ELSE c.paciente_id END AS contato_id,
                    u.nome AS contato_nome,
                    u.foto_url AS contato_foto,
                    CASE WHEN c.paciente_id = $1 THEN c.unread_paciente ELSE c.unread_psicologo END AS unread_count,
                    c.ultima_mensagem,
                    c.ultima_mensagem_em
             FROM conversas c
             JOIN usuarios u
               ON u.id = CASE WHEN c.paciente_id = $1 THEN c.psicologo_id ELSE c.paciente_id END
             WHERE (c.paciente_id = $1 OR c.psicologo_id = $1)
               AND c.ativa = true
             ORDER BY c.ultima_mensagem_em DESC NULLS LAST, c.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(conversas)
    }

    /// Zeroes the caller's unread counter and flips the counterpart's pending
    /// messages to `lida` in one transaction, so counter and message flags
    /// stay coherent. Both statements are no-ops when there is nothing unread.
    pub async fn mark_read(&self, conversa_id: Uuid, user_id: Uuid) -> Result<Conversa> {
        let mut tx = self.pool.begin().await?;

        let conversa = sqlx::query_as::<_, Conversa>(
            "UPDATE conversas SET
                unread_paciente = CASE WHEN paciente_id = $2 THEN 0 ELSE unread_paciente END,
                unread_psicologo = CASE WHEN psicologo_id = $2 THEN 0 ELSE unread_psicologo END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(conversa_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE mensagens SET lida = true, lida_em = NOW()
             WHERE conversa_id = $1 AND remetente_id <> $2 AND lida = false",
        )
        .bind(conversa_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(conversa)
    }
}
