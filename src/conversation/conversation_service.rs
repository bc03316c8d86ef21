use uuid::Uuid;

use crate::crypto::ContentCipher;
use crate::error::{is_unique_violation, AppError, Result};
use crate::user::{Papel, UserRepository};
use crate::websocket::{EventPublisher, WsMessage};

use super::conversation_dto::ConversaResumo;
use super::conversation_models::{Conversa, ConversaResponse};
use super::conversation_repository::ConversationRepository;

#[derive(Clone)]
pub struct ConversationService {
    repo: ConversationRepository,
    user_repo: UserRepository,
    cipher: ContentCipher,
    events: EventPublisher,
}

impl ConversationService {
    pub fn new(
        repo: ConversationRepository,
        user_repo: UserRepository,
        cipher: ContentCipher,
        events: EventPublisher,
    ) -> Self {
        Self {
            repo,
            user_repo,
            cipher,
            events,
        }
    }

    /// Find-or-create the single active conversation for a (paciente,
    /// psicologo) pair. Idempotent under concurrency: a lost create race
    /// (unique violation on the pair index) falls back to the lookup.
    pub async fn find_or_create(
        &self,
        caller_id: Uuid,
        paciente_id: Uuid,
        psicologo_id: Uuid,
    ) -> Result<ConversaResponse> {
        if caller_id != paciente_id && caller_id != psicologo_id {
            return Err(AppError::PermissionDenied(
                "Você não participa desta conversa".to_string(),
            ));
        }

        self.verificar_papel(paciente_id, Papel::Paciente).await?;
        self.verificar_papel(psicologo_id, Papel::Psicologo).await?;

        if let Some(conversa) = self.repo.find_by_pair(paciente_id, psicologo_id).await? {
            return self.to_response(conversa);
        }

        let conversa = match self.repo.create(paciente_id, psicologo_id).await {
            Ok(conversa) => conversa,
            Err(AppError::StoreUnavailable(ref e)) if is_unique_violation(e) => self
                .repo
                .find_by_pair(paciente_id, psicologo_id)
                .await?
                .ok_or(AppError::ConversationNotFound)?,
            Err(e) => return Err(e),
        };

        self.to_response(conversa)
    }

    /// Caller's conversations, most recent activity first, previews decrypted.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<ConversaResumo>> {
        let rows = self.repo.list_for_user(user_id).await?;

        let mut resumos = Vec::with_capacity(rows.len());
        for row in rows {
            let ultima = match &row.ultima_mensagem {
                Some(blob) => Some(self.cipher.decrypt(blob)?),
                None => None,
            };
            resumos.push(ConversaResumo::from_decrypted(row, ultima));
        }

        Ok(resumos)
    }

    /// Resets the caller's unread counter and marks the counterpart's
    /// messages read. The counterpart observes the change through the next
    /// conversation-updated event.
    pub async fn mark_read(&self, caller_id: Uuid, conversa_id: Uuid) -> Result<ConversaResponse> {
        let conversa = self
            .repo
            .find_by_id(conversa_id)
            .await?
            .ok_or(AppError::ConversationNotFound)?;

        if !conversa.participante(caller_id) {
            return Err(AppError::PermissionDenied(
                "Você não participa desta conversa".to_string(),
            ));
        }

        let conversa = self.repo.mark_read(conversa_id, caller_id).await?;
        let response = self.to_response(conversa)?;

        self.events
            .publish(conversa_id, &WsMessage::ConversationUpdated(response.clone()))
            .await;

        Ok(response)
    }

    pub fn to_response(&self, conversa: Conversa) -> Result<ConversaResponse> {
        let ultima = match &conversa.ultima_mensagem {
            Some(blob) => Some(self.cipher.decrypt(blob)?),
            None => None,
        };
        Ok(ConversaResponse::from_decrypted(conversa, ultima))
    }

    async fn verificar_papel(&self, user_id: Uuid, esperado: Papel) -> Result<()> {
        let usuario = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::InvalidInput("Participante inexistente".to_string()))?;

        if usuario.papel != esperado {
            return Err(AppError::InvalidInput(format!(
                "Usuário {} não tem papel de {}",
                user_id, esperado
            )));
        }

        Ok(())
    }
}
