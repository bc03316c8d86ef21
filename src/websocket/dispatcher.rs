use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::connection::ConnectionManager;
use super::types::WsMessage;

/// Routes change-feed events to the users subscribed to each conversation.
///
/// Invariant: at most one active subscription per (user, conversation).
/// `subscribe` is a no-op when the pair is already registered, so an event is
/// never delivered twice to the same socket, and `unsubscribe_all` clears
/// every registration on socket tear-down.
#[derive(Clone)]
pub struct SubscriptionDispatcher {
    connections: ConnectionManager,
    subscriptions: Arc<DashMap<Uuid, HashSet<Uuid>>>,
}

impl SubscriptionDispatcher {
    pub fn new(connections: ConnectionManager) -> Self {
        Self {
            connections,
            subscriptions: Arc::new(DashMap::new()),
        }
    }

    /// Returns `true` when this call created the subscription, `false` when
    /// the (user, conversation) pair was already subscribed.
    pub fn subscribe(&self, conversa_id: Uuid, user_id: Uuid) -> bool {
        self.subscriptions
            .entry(conversa_id)
            .or_default()
            .insert(user_id)
    }

    /// Returns `true` when a subscription was actually removed.
    pub fn unsubscribe(&self, conversa_id: Uuid, user_id: Uuid) -> bool {
        let removed = {
            match self.subscriptions.get_mut(&conversa_id) {
                Some(mut users) => users.remove(&user_id),
                None => false,
            }
        };
        self.subscriptions.remove_if(&conversa_id, |_, users| users.is_empty());
        removed
    }

    /// Drops every subscription held by the user and returns the conversation
    /// channels left, so callers can clear presence for each.
    pub fn unsubscribe_all(&self, user_id: Uuid) -> Vec<Uuid> {
        let mut deixadas = Vec::new();
        self.subscriptions.retain(|conversa_id, users| {
            if users.remove(&user_id) {
                deixadas.push(*conversa_id);
            }
            !users.is_empty()
        });
        deixadas
    }

    pub fn is_subscribed(&self, conversa_id: Uuid, user_id: Uuid) -> bool {
        self.subscriptions
            .get(&conversa_id)
            .map(|users| users.contains(&user_id))
            .unwrap_or(false)
    }

    /// Fans one event out to the local subscribers of a conversation.
    pub fn dispatch_local(&self, conversa_id: Uuid, event: WsMessage) {
        if let Some(users) = self.subscriptions.get(&conversa_id) {
            for user_id in users.iter() {
                self.connections.send_to_user(user_id, event.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::types::{ErrorPayload, WsMessage};
    use tokio::sync::mpsc;

    fn evento() -> WsMessage {
        WsMessage::Error(ErrorPayload {
            erro: "x".to_string(),
            codigo: "INVALID_INPUT".to_string(),
        })
    }

    #[tokio::test]
    async fn test_duplicate_subscribe_delivers_once() {
        let connections = ConnectionManager::new();
        let dispatcher = SubscriptionDispatcher::new(connections.clone());
        let conversa_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let (tx, mut rx) = mpsc::unbounded_channel();
        connections.add_connection(user_id, tx);

        assert!(dispatcher.subscribe(conversa_id, user_id));
        assert!(!dispatcher.subscribe(conversa_id, user_id));

        dispatcher.dispatch_local(conversa_id, evento());

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_only_subscribers_receive() {
        let connections = ConnectionManager::new();
        let dispatcher = SubscriptionDispatcher::new(connections.clone());
        let conversa_id = Uuid::new_v4();
        let assinante = Uuid::new_v4();
        let outro = Uuid::new_v4();

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        connections.add_connection(assinante, tx_a);
        connections.add_connection(outro, tx_b);

        dispatcher.subscribe(conversa_id, assinante);
        dispatcher.dispatch_local(conversa_id, evento());

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let connections = ConnectionManager::new();
        let dispatcher = SubscriptionDispatcher::new(connections.clone());
        let conversa_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let (tx, mut rx) = mpsc::unbounded_channel();
        connections.add_connection(user_id, tx);

        dispatcher.subscribe(conversa_id, user_id);
        assert!(dispatcher.unsubscribe(conversa_id, user_id));
        assert!(!dispatcher.unsubscribe(conversa_id, user_id));

        dispatcher.dispatch_local(conversa_id, evento());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_all_returns_left_channels() {
        let connections = ConnectionManager::new();
        let dispatcher = SubscriptionDispatcher::new(connections);
        let user_id = Uuid::new_v4();
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();

        dispatcher.subscribe(c1, user_id);
        dispatcher.subscribe(c2, user_id);

        let mut deixadas = dispatcher.unsubscribe_all(user_id);
        deixadas.sort();
        let mut esperadas = vec![c1, c2];
        esperadas.sort();

        assert_eq!(deixadas, esperadas);
        assert!(!dispatcher.is_subscribed(c1, user_id));
    }
}
