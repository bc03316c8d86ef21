//! Redis-backed change feed for conversation events.
//!
//! Every realtime event (new message, conversation update, message read,
//! presence snapshot) is published to the channel `conversa.{conversa_id}`.
//! One relay task per process holds the pattern subscription `conversa.*`
//! and fans incoming events out to the locally connected subscribers:
//!
//! ```text
//!  services ──publish──► Redis `conversa.{id}` ──relay──► local subscribers
//! ```
//!
//! Publishing and delivery are best-effort: the store is the source of
//! truth, and clients reconcile missed events by refetching history after a
//! reconnect. Events seen during a disconnect window are not replayed.

use futures::StreamExt;
use redis::AsyncCommands;
use uuid::Uuid;

use super::dispatcher::SubscriptionDispatcher;
use super::types::WsMessage;

const CONVERSA_CHANNEL_PREFIX: &str = "conversa";

fn channel_name(conversa_id: Uuid) -> String {
    format!("{CONVERSA_CHANNEL_PREFIX}.{conversa_id}")
}

#[derive(Clone)]
pub struct EventPublisher {
    conn: redis::aio::MultiplexedConnection,
}

impl EventPublisher {
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Publishes into the conversation's change-feed channel. Failures are
    /// logged and swallowed.
    pub async fn publish(&self, conversa_id: Uuid, event: &WsMessage) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("falha ao serializar evento da conversa {}: {}", conversa_id, e);
                return;
            }
        };

        let mut conn = self.conn.clone();
        let result: redis::RedisResult<i64> = conn.publish(channel_name(conversa_id), payload).await;
        if let Err(e) = result {
            tracing::warn!("falha ao publicar evento da conversa {}: {}", conversa_id, e);
        }
    }
}

/// Runs the per-process relay: pattern subscription on `conversa.*`,
/// reconnecting when the subscription drops.
pub async fn run_event_relay(client: redis::Client, dispatcher: SubscriptionDispatcher) {
    loop {
        if let Err(e) = relay_once(&client, &dispatcher).await {
            tracing::warn!("assinatura do feed de mudanças caiu: {}", e);
        }
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }
}

async fn relay_once(
    client: &redis::Client,
    dispatcher: &SubscriptionDispatcher,
) -> redis::RedisResult<()> {
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub
        .psubscribe(format!("{CONVERSA_CHANNEL_PREFIX}.*"))
        .await?;

    tracing::info!("relay do feed de mudanças assinado em {}.*", CONVERSA_CHANNEL_PREFIX);

    let mut stream = pubsub.into_on_message();
    while let Some(msg) = stream.next().await {
        let channel = msg.get_channel_name().to_string();

        let Some(id_part) = channel
            .strip_prefix(CONVERSA_CHANNEL_PREFIX)
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            continue;
        };
        let Ok(conversa_id) = Uuid::parse_str(id_part) else {
            tracing::warn!("canal de conversa com id inválido: {}", channel);
            continue;
        };

        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(_) => continue,
        };

        // Decode step at the feed boundary: malformed events are dropped
        // instead of reaching subscribers.
        match serde_json::from_str::<WsMessage>(&payload) {
            Ok(event) => dispatcher.dispatch_local(conversa_id, event),
            Err(e) => tracing::warn!("evento inválido no canal {}: {}", channel, e),
        }
    }

    Ok(())
}
