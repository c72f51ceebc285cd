//! REST endpoints for the gateway.
//!
//! The realtime surface lives on the WebSocket; HTTP only answers
//! liveness checks.

pub mod health;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::GatewayState;

/// Create all REST API routes
pub fn create_rest_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/health", get(health::health_check))
}

pub use health::*;
