use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;
use validator::Validate;

use crate::conversation::{ConversaResponse, ConversationRepository};
use crate::crypto::ContentCipher;
use crate::error::{AppError, Result};
use crate::websocket::{types::MessageReadPayload, EventPublisher, WsMessage};

use super::message_dto::EnviarMensagemRequest;
use super::message_models::{MensagemResponse, TipoMensagem};
use super::message_repository::MessageRepository;

const PREVIEW_MAX_CHARS: usize = 80;

#[derive(Clone)]
pub struct MessageService {
    repo: MessageRepository,
    conversation_repo: ConversationRepository,
    cipher: ContentCipher,
    events: EventPublisher,
    message_tx: broadcast::Sender<(Uuid, MensagemResponse)>,
}

impl MessageService {
    pub fn new(
        repo: MessageRepository,
        conversation_repo: ConversationRepository,
        cipher: ContentCipher,
        events: EventPublisher,
        message_tx: broadcast::Sender<(Uuid, MensagemResponse)>,
    ) -> Self {
        Self {
            repo,
            conversation_repo,
            cipher,
            events,
            message_tx,
        }
    }

    /// Persists a message and notifies both sides. The store commit is the
    /// source of truth; event delivery is best-effort and clients reconcile
    /// missed events via the history endpoint. At-least-once from the
    /// caller's view: a failed response after commit may yield a duplicate
    /// on retry.
    pub async fn send_message(
        &self,
        remetente_id: Uuid,
        conversa_id: Uuid,
        payload: EnviarMensagemRequest,
    ) -> Result<MensagemResponse> {
        payload.validate()?;

        let conversa = self
            .conversation_repo
            .find_by_id(conversa_id)
            .await?
            .ok_or(AppError::ConversationNotFound)?;

        if !conversa.participante(remetente_id) {
            return Err(AppError::PermissionDenied(
                "Você não participa desta conversa".to_string(),
            ));
        }

        if !conversa.ativa {
            return Err(AppError::InvalidInput("Conversa encerrada".to_string()));
        }

        let tipo = payload.tipo.unwrap_or(TipoMensagem::Text);
        let preview = montar_preview(&payload.conteudo, tipo);

        let conteudo_cifrado = self.cipher.encrypt(&payload.conteudo)?;
        let preview_cifrado = self.cipher.encrypt(&preview)?;

        let (mensagem, conversa_atualizada) = self
            .repo
            .create(
                conversa_id,
                remetente_id,
                &conteudo_cifrado,
                &preview_cifrado,
                tipo,
            )
            .await?;

        let destinatario_id = conversa.contraparte(remetente_id);
        let response = MensagemResponse::from_decrypted(mensagem, payload.conteudo);

        self.events
            .publish(conversa_id, &WsMessage::NewMessage(response.clone()))
            .await;

        let conversa_response =
            ConversaResponse::from_decrypted(conversa_atualizada, Some(preview));
        self.events
            .publish(conversa_id, &WsMessage::ConversationUpdated(conversa_response))
            .await;

        // SSE fallback feed; no receivers is fine.
        let _ = self.message_tx.send((destinatario_id, response.clone()));

        Ok(response)
    }

    /// Paginated history. Pages walk backwards from the newest message;
    /// within a page messages are returned oldest-to-newest. Content is
    /// decrypted per request and never cached.
    pub async fn get_history(
        &self,
        user_id: Uuid,
        conversa_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MensagemResponse>, i64)> {
        let conversa = self
            .conversation_repo
            .find_by_id(conversa_id)
            .await?
            .ok_or(AppError::ConversationNotFound)?;

        if !conversa.participante(user_id) {
            return Err(AppError::PermissionDenied(
                "Você não participa desta conversa".to_string(),
            ));
        }

        let rows = self
            .repo
            .find_by_conversation(conversa_id, limit, offset)
            .await?;
        let total = self.repo.count_by_conversation(conversa_id).await?;

        let mut mensagens = Vec::with_capacity(rows.len());
        for row in rows.into_iter().rev() {
            let conteudo = self.cipher.decrypt(&row.conteudo)?;
            mensagens.push(MensagemResponse::from_decrypted(row, conteudo));
        }

        Ok((mensagens, total))
    }

    /// Idempotent unread→read transition for a single message.
    pub async fn mark_read(&self, reader_id: Uuid, mensagem_id: Uuid) -> Result<()> {
        let mensagem = self
            .repo
            .find_by_id(mensagem_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Mensagem não encontrada".to_string()))?;

        let conversa = self
            .conversation_repo
            .find_by_id(mensagem.conversa_id)
            .await?
            .ok_or(AppError::ConversationNotFound)?;

        if !conversa.participante(reader_id) {
            return Err(AppError::PermissionDenied(
                "Você não participa desta conversa".to_string(),
            ));
        }

        if let Some(atualizada) = self.repo.mark_as_read(mensagem_id, reader_id).await? {
            self.events
                .publish(
                    conversa.id,
                    &WsMessage::MessageRead(MessageReadPayload {
                        mensagem_id,
                        conversa_id: conversa.id,
                        lida_em: atualizada.lida_em.unwrap_or_else(Utc::now),
                    }),
                )
                .await;
        }

        Ok(())
    }
}

fn montar_preview(conteudo: &str, tipo: TipoMensagem) -> String {
    match tipo {
        TipoMensagem::Image => "[imagem]".to_string(),
        TipoMensagem::File => "[arquivo]".to_string(),
        TipoMensagem::Text => {
            if conteudo.chars().count() > PREVIEW_MAX_CHARS {
                let mut preview: String = conteudo.chars().take(PREVIEW_MAX_CHARS).collect();
                preview.push('…');
                preview
            } else {
                conteudo.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_texto_curto() {
        assert_eq!(montar_preview("Olá!", TipoMensagem::Text), "Olá!");
    }

    #[test]
    fn test_preview_texto_longo_truncado() {
        let longo = "a".repeat(200);
        let preview = montar_preview(&longo, TipoMensagem::Text);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS + 1);
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn test_preview_midia() {
        assert_eq!(montar_preview("ignorado", TipoMensagem::Image), "[imagem]");
        assert_eq!(montar_preview("ignorado", TipoMensagem::File), "[arquivo]");
    }
}
