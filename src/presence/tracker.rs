use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Typing without a refresh within this window reads as not typing; there is
/// no explicit keepalive frame, clients just re-send `set_presence`.
pub const TYPING_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub online: bool,
    pub typing: bool,
}

#[derive(Debug, Clone, Copy)]
struct Entrada {
    online: bool,
    typing: bool,
    atualizado_em: Instant,
}

/// Ephemeral presence state per conversation channel. Nothing is persisted:
/// entries appear when a subscribed session publishes state and are removed
/// when the session ends, so late joiners only ever see a fresh snapshot.
#[derive(Clone)]
pub struct PresenceTracker {
    canais: Arc<DashMap<Uuid, HashMap<Uuid, Entrada>>>,
    typing_ttl: Duration,
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self {
            canais: Arc::new(DashMap::new()),
            typing_ttl: TYPING_TTL,
        }
    }

    #[cfg(test)]
    fn with_typing_ttl(typing_ttl: Duration) -> Self {
        Self {
            canais: Arc::new(DashMap::new()),
            typing_ttl,
        }
    }

    pub fn set(&self, conversa_id: Uuid, user_id: Uuid, online: bool, typing: bool) {
        self.canais.entry(conversa_id).or_default().insert(
            user_id,
            Entrada {
                online,
                typing,
                atualizado_em: Instant::now(),
            },
        );
    }

    /// Removes the user's record from the channel; returns whether one
    /// existed. Empty channels are dropped.
    pub fn clear(&self, conversa_id: Uuid, user_id: Uuid) -> bool {
        let existed = {
            match self.canais.get_mut(&conversa_id) {
                Some(mut canal) => canal.remove(&user_id).is_some(),
                None => false,
            }
        };
        self.canais.remove_if(&conversa_id, |_, canal| canal.is_empty());
        existed
    }

    /// Full current state of the channel, staleness applied to typing.
    pub fn snapshot(&self, conversa_id: Uuid) -> HashMap<Uuid, Vec<PresenceRecord>> {
        match self.canais.get(&conversa_id) {
            Some(canal) => canal
                .iter()
                .map(|(user_id, entrada)| {
                    let typing = entrada.typing && entrada.atualizado_em.elapsed() < self.typing_ttl;
                    (
                        *user_id,
                        vec![PresenceRecord {
                            online: entrada.online,
                            typing,
                        }],
                    )
                })
                .collect(),
            None => HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::types::{PresencePayload, WsMessage};
    use crate::websocket::{ConnectionManager, SubscriptionDispatcher};
    use tokio::sync::mpsc;

    #[test]
    fn test_snapshot_roundtrip() {
        let tracker = PresenceTracker::new();
        let conversa_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        tracker.set(conversa_id, user_id, true, true);

        let snapshot = tracker.snapshot(conversa_id);
        let records = snapshot.get(&user_id).unwrap();
        assert_eq!(
            records.as_slice(),
            &[PresenceRecord {
                online: true,
                typing: true
            }]
        );
    }

    #[test]
    fn test_typing_expira_sem_refresh() {
        let tracker = PresenceTracker::with_typing_ttl(Duration::ZERO);
        let conversa_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        tracker.set(conversa_id, user_id, true, true);

        let records = tracker.snapshot(conversa_id);
        let record = records.get(&user_id).unwrap()[0];
        assert!(record.online);
        assert!(!record.typing);
    }

    #[test]
    fn test_clear_remove_registro() {
        let tracker = PresenceTracker::new();
        let conversa_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        tracker.set(conversa_id, user_id, true, false);
        assert!(tracker.clear(conversa_id, user_id));
        assert!(!tracker.clear(conversa_id, user_id));
        assert!(tracker.snapshot(conversa_id).is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_chega_ao_assinante() {
        let connections = ConnectionManager::new();
        let dispatcher = SubscriptionDispatcher::new(connections.clone());
        let tracker = PresenceTracker::new();

        let conversa_id = Uuid::new_v4();
        let quem_digita = Uuid::new_v4();
        let observador = Uuid::new_v4();

        let (tx, mut rx) = mpsc::unbounded_channel();
        connections.add_connection(observador, tx);
        dispatcher.subscribe(conversa_id, observador);

        tracker.set(conversa_id, quem_digita, true, true);
        dispatcher.dispatch_local(
            conversa_id,
            WsMessage::Presence(PresencePayload {
                conversa_id,
                estados: tracker.snapshot(conversa_id),
            }),
        );

        match rx.try_recv().unwrap() {
            WsMessage::Presence(payload) => {
                assert_eq!(payload.conversa_id, conversa_id);
                let records = payload.estados.get(&quem_digita).unwrap();
                assert!(records[0].online);
                assert!(records[0].typing);
            }
            other => panic!("evento inesperado: {:?}", other),
        }
    }
}
