use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::types::WsMessage;

pub type WsSender = mpsc::UnboundedSender<WsMessage>;

/// Registry of live signaling sockets, one per user per device session.
/// A reconnect replaces the previous sender; the stale send task ends when
/// its receiver is dropped.
#[derive(Clone, Default)]
pub struct ConnectionManager {
    connections: Arc<DashMap<Uuid, WsSender>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_connection(&self, user_id: Uuid, sender: WsSender) {
        self.connections.insert(user_id, sender);
    }

    pub fn remove_connection(&self, user_id: &Uuid) {
        self.connections.remove(user_id);
    }

    pub fn send_to_user(&self, user_id: &Uuid, message: WsMessage) {
        if let Some(sender) = self.connections.get(user_id) {
            // A closed receiver means the socket is already tearing down.
            let _ = sender.send(message);
        }
    }
}
