//! Connection authentication.
//!
//! Credentials arrive through one of three carriers, tried in order: the
//! Authorization header on the upgrade request, a `token` query parameter,
//! and an `authenticate` event sent as the first message after the
//! upgrade. The first carrier present must verify; a bad token never falls
//! through to the next carrier.

use axum::http::{header, HeaderMap};
use serde::Deserialize;
use tracing::warn;

use courier_users::{TokenVerifier, UserDirectory};

use crate::error::{GatewayError, GatewayResult};

/// Verified identity of a connected user.
///
/// `user_id` always comes from the verified token subject. The profile
/// fields are directory enrichment and may be absent when the directory
/// cannot be reached.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Query parameters accepted on the WebSocket upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

/// Pick the first credential present on the upgrade request itself.
pub fn handshake_credential(headers: &HeaderMap, query: &ConnectQuery) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| query.token.clone())
}

/// Verify a bearer token and enrich the resulting identity from the user
/// directory.
///
/// A directory outage degrades to the token's own claims; a subject the
/// directory definitively does not know is rejected.
pub async fn authenticate(
    verifier: &TokenVerifier,
    directory: &UserDirectory,
    token: &str,
) -> GatewayResult<UserIdentity> {
    let claims = verifier
        .verify_token(token)
        .map_err(|e| GatewayError::InvalidCredentials(e.to_string()))?;

    match directory.find_by_public_id(&claims.sub).await {
        Ok(Some(user)) => Ok(UserIdentity {
            user_id: user.public_id,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
        }),
        Ok(None) => Err(GatewayError::UnknownSubject(claims.sub)),
        Err(e) => {
            warn!(subject = %claims.sub, error = %e, "directory lookup failed, continuing with token claims");
            Ok(UserIdentity {
                user_id: claims.sub,
                display_name: None,
                avatar_url: None,
            })
        }
    }
}
