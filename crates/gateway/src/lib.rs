//! # Courier Gateway Crate
//!
//! This crate is the realtime layer of Courier: it authenticates WebSocket
//! connections, tracks which user owns which live session, and fans
//! room-scoped events out to every member the store says should see them.
//!
//! ## Architecture
//!
//! - **auth**: bearer-token verification with best-effort directory enrichment
//! - **registry**: user-to-session map where the last connection wins
//! - **index**: per-session room subscriptions mirrored from the store
//! - **broadcast**: store-driven fan-out with closed-transport eviction
//! - **ingest**: validate, store media, persist, then broadcast
//! - **websocket / rest**: the wire surface and a liveness check

pub mod auth;
pub mod broadcast;
pub mod error;
pub mod index;
pub mod ingest;
pub mod middleware;
pub mod registry;
pub mod rest;
pub mod state;
pub mod websocket;

// Re-export main types for convenience
pub use auth::UserIdentity;
pub use broadcast::BroadcastEngine;
pub use error::{GatewayError, GatewayResult};
pub use index::RoomIndex;
pub use ingest::MessagePipeline;
pub use registry::{SessionHandle, SessionRegistry};
pub use state::GatewayState;
pub use websocket::events::{ClientEvent, ServerEvent, UserView};

use axum::{http::Method, middleware as axum_middleware, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let arc_state = Arc::new(state);

    Router::new()
        // REST routes
        .merge(rest::create_rest_routes().with_state(arc_state.clone()))
        // WebSocket routes
        .merge(websocket::create_websocket_routes().with_state(arc_state))
        // CORS middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                ])
                .allow_headers(Any),
        )
        // Logging middleware
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
