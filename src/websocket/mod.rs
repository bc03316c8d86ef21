pub mod connection;
pub mod dispatcher;
pub mod handler;
pub mod relay;
pub mod types;

pub use connection::{ConnectionManager, WsSender};
pub use dispatcher::SubscriptionDispatcher;
pub use handler::ws_handler;
pub use relay::{run_event_relay, EventPublisher};
pub use types::WsMessage;
