//! Cross-cutting request middleware

use axum::{extract::Request, http::StatusCode, middleware::Next, response::IntoResponse};
use tracing::{debug, info};

/// Log one line per completed request.
///
/// The query string can carry a bearer token on websocket upgrades, so only
/// the path is logged. For an upgrade the duration covers the handshake, not
/// the session that follows it.
pub async fn logging_middleware(
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    let status = response.status();
    let duration_ms = duration.as_millis();

    // Liveness probes poll on a short interval; keep them out of the info log.
    if path == "/health" {
        debug!(%method, %path, %status, duration_ms, "request completed");
    } else {
        info!(%method, %path, %status, duration_ms, "request completed");
    }

    Ok(response)
}
