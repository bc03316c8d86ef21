pub mod tracker;

pub use tracker::{PresenceRecord, PresenceTracker};

use uuid::Uuid;

use crate::websocket::types::PresencePayload;
use crate::websocket::{EventPublisher, WsMessage};

/// Applies presence changes to the in-process tracker and publishes the
/// resulting channel snapshot through the change feed. Publishing is
/// best-effort: presence is non-critical and failures are only logged.
#[derive(Clone)]
pub struct PresenceService {
    tracker: PresenceTracker,
    events: EventPublisher,
}

impl PresenceService {
    pub fn new(tracker: PresenceTracker, events: EventPublisher) -> Self {
        Self { tracker, events }
    }

    pub async fn set_presence(&self, conversa_id: Uuid, user_id: Uuid, online: bool, typing: bool) {
        self.tracker.set(conversa_id, user_id, online, typing);
        self.publicar_snapshot(conversa_id).await;
    }

    /// Drops the user's record on session end and announces the new state.
    pub async fn clear(&self, conversa_id: Uuid, user_id: Uuid) {
        if self.tracker.clear(conversa_id, user_id) {
            self.publicar_snapshot(conversa_id).await;
        }
    }

    async fn publicar_snapshot(&self, conversa_id: Uuid) {
        let estados = self.tracker.snapshot(conversa_id);
        self.events
            .publish(
                conversa_id,
                &WsMessage::Presence(PresencePayload {
                    conversa_id,
                    estados,
                }),
            )
            .await;
    }
}
