//! WebSocket endpoint for the realtime session

pub mod connection;
pub mod events;
pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::GatewayState;

/// Create the WebSocket routes
pub fn create_websocket_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/ws", get(connection::websocket_handler))
}

// Re-export for convenience
pub use connection::websocket_handler;
pub use events::{ClientEvent, ServerEvent, UserView};
