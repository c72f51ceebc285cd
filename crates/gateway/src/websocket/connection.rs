//! WebSocket connection lifecycle.
//!
//! A connection is always upgraded first so the client can receive a
//! structured error event instead of an opaque HTTP rejection. Identity
//! must then settle inside the configured handshake window; after that the
//! session is registered, hydrated, and serviced until the transport
//! closes.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{authenticate, handshake_credential, ConnectQuery, UserIdentity};
use crate::error::{GatewayError, GatewayResult};
use crate::registry::SessionHandle;
use crate::state::GatewayState;
use crate::websocket::events::{ClientEvent, ServerEvent, UserView};
use crate::websocket::handlers::handle_client_event;

/// Upgrade handler for `/ws`.
pub async fn websocket_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let credential = handshake_credential(&headers, &query);
    ws.on_upgrade(move |socket| handle_socket(socket, state, credential))
}

async fn handle_socket(socket: WebSocket, state: Arc<GatewayState>, credential: Option<String>) {
    let (mut ws_sender, mut receiver) = socket.split();

    let identity = match tokio::time::timeout(
        state.handshake_window,
        settle_identity(&state, credential, &mut receiver),
    )
    .await
    {
        Ok(Ok(identity)) => identity,
        Ok(Err(err)) => {
            reject(&mut ws_sender, &err).await;
            return;
        }
        Err(_) => {
            reject(&mut ws_sender, &GatewayError::MissingCredentials).await;
            return;
        }
    };

    let session_id = Uuid::new_v4().to_string();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Writer task. The queue is the only path to the socket, so a session
    // receives events in exactly the order they were queued.
    let sender_task = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to encode outbound event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let handle = SessionHandle::new(session_id.clone(), identity.user_id.clone(), out_tx.clone());
    if let Some(superseded) = state.registry.register(handle).await {
        debug!(
            user = %identity.user_id,
            superseded = %superseded,
            "newer connection replaced an active session"
        );
    }

    if let Err(e) = state.directory.set_online(&identity.user_id, true).await {
        warn!(user = %identity.user_id, error = %e, "failed to mark user online");
    }

    let rooms = state.index.hydrate(&session_id, &identity.user_id).await;
    info!(
        user = %identity.user_id,
        session = %session_id,
        rooms = rooms.len(),
        "session established"
    );

    let _ = out_tx.send(ServerEvent::Hello {
        user: UserView {
            id: identity.user_id.clone(),
            display_name: identity.display_name.clone(),
            avatar_url: identity.avatar_url.clone(),
            is_online: true,
            last_active_at: None,
        },
    });

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    handle_client_event(event, &state, &session_id, &identity, &out_tx).await;
                }
                Err(e) => {
                    debug!(user = %identity.user_id, error = %e, "discarding malformed client event");
                    let _ = out_tx.send(ServerEvent::Error {
                        kind: "validation".to_string(),
                        message: "Malformed event".to_string(),
                    });
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(user = %identity.user_id, error = %e, "websocket receive error");
                break;
            }
        }
    }

    // Teardown. Forget the session first so fan-out stops addressing it,
    // then flip presence only if no replacement session took over.
    state.registry.unregister(&session_id).await;
    state.index.remove_session(&session_id).await;

    if state.registry.resolve(&identity.user_id).await.is_none() {
        if let Err(e) = state.directory.set_online(&identity.user_id, false).await {
            warn!(user = %identity.user_id, error = %e, "failed to mark user offline");
        }
    }

    drop(out_tx);
    let _ = sender_task.await;

    info!(user = %identity.user_id, session = %session_id, "session closed");
}

/// Resolve the connection's identity inside the handshake window.
///
/// A credential carried on the upgrade request wins; otherwise the first
/// client event must be `authenticate`. Anything else ends the handshake
/// with missing credentials.
async fn settle_identity(
    state: &GatewayState,
    credential: Option<String>,
    receiver: &mut SplitStream<WebSocket>,
) -> GatewayResult<UserIdentity> {
    if let Some(token) = credential {
        return authenticate(&state.verifier, &state.directory, &token).await;
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                return match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(ClientEvent::Authenticate { token: Some(token) }) => {
                        authenticate(&state.verifier, &state.directory, &token).await
                    }
                    _ => Err(GatewayError::MissingCredentials),
                };
            }
            Ok(Message::Close(_)) | Err(_) => return Err(GatewayError::MissingCredentials),
            Ok(_) => {}
        }
    }

    Err(GatewayError::MissingCredentials)
}

/// Send a terminal error event and close the socket.
async fn reject(ws_sender: &mut SplitSink<WebSocket, Message>, err: &GatewayError) {
    info!(kind = err.kind(), error = %err, "rejecting websocket connection");

    let event = ServerEvent::Error {
        kind: err.kind().to_string(),
        message: err.to_string(),
    };
    if let Ok(json) = serde_json::to_string(&event) {
        let _ = ws_sender.send(Message::Text(json)).await;
    }
    let _ = ws_sender.close().await;
}
