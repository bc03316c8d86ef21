mod auth;
mod conversation;
mod crypto;
mod db;
mod error;
mod message;
mod middleware;
mod presence;
mod routes;
mod state;
mod user;
mod websocket;

use db::{create_pool, run_migrations};
use routes::create_router;
use state::{AppState, Config};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,acolhe_chat=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());

    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        anyhow::anyhow!("DATABASE_URL environment variable is not set")
    })?;

    // Sanitize URL for logging (hide password)
    let url_for_logging = database_url
        .split('@')
        .next()
        .map(|part| format!("{}@<hidden>", part))
        .unwrap_or_else(|| "<invalid format>".to_string());

    tracing::info!("Connecting to database at {}...", url_for_logging);
    let db = create_pool(&database_url).await?;

    // Run migrations
    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    // Content cipher: message bodies and previews are encrypted at rest
    let cipher = crypto::ContentCipher::from_hex(&config.content_key)
        .map_err(|e| anyhow::anyhow!("invalid CONTENT_KEY: {}", e))?;

    // Redis change feed: publisher connection + relay subscription
    let redis_client = redis::Client::open(config.redis_url.clone())?;
    let redis_conn = redis_client.get_multiplexed_async_connection().await?;
    let events = websocket::EventPublisher::new(redis_conn);

    // WebSocket connection manager and per-conversation dispatcher
    let ws_connections = websocket::ConnectionManager::new();
    let dispatcher = websocket::SubscriptionDispatcher::new(ws_connections.clone());
    let presence = presence::PresenceService::new(presence::PresenceTracker::new(), events.clone());

    // Create message broadcaster (SSE fallback feed)
    let (message_tx, _) = broadcast::channel(100);

    // Create repositories
    let user_repository = user::UserRepository::new(db.clone());
    let conversation_repository = conversation::ConversationRepository::new(db.clone());
    let message_repository = message::MessageRepository::new(db.clone());

    // Create services
    let conversation_service = conversation::ConversationService::new(
        conversation_repository.clone(),
        user_repository.clone(),
        cipher.clone(),
        events.clone(),
    );
    let message_service = message::MessageService::new(
        message_repository,
        conversation_repository.clone(),
        cipher,
        events,
        message_tx.clone(),
    );

    // Start the change-feed relay
    tokio::spawn(websocket::run_event_relay(redis_client, dispatcher.clone()));

    // Create application state
    let state = AppState {
        db,
        config,
        message_tx,
        ws_connections,
        dispatcher,
        presence,
        user_repository,
        conversation_repository,
        conversation_service,
        message_service,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
