//! Client event dispatch.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use courier_database::{Room, User};
use courier_rooms::{CreateRoomRequest, MessagePage};

use crate::auth::UserIdentity;
use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;
use crate::websocket::events::{ClientEvent, ServerEvent, UserView};

/// Handle one decoded client event.
///
/// Failures are reported back on the session's own queue and never tear
/// the connection down: message submissions answer with `message-error`,
/// everything else with a generic `error` event.
pub async fn handle_client_event(
    event: ClientEvent,
    state: &GatewayState,
    session_id: &str,
    identity: &UserIdentity,
    out_tx: &mpsc::UnboundedSender<ServerEvent>,
) {
    let result = match event {
        // The session already authenticated; repeated credentials are ignored
        ClientEvent::Authenticate { .. } => Ok(()),
        ClientEvent::JoinRoom { room_id } => join_room(state, session_id, &room_id).await,
        ClientEvent::LeaveRoom { room_id } => leave_room(state, session_id, &room_id).await,
        ClientEvent::CreateRoom(request) => {
            create_room(state, session_id, identity, &request, out_tx).await
        }
        ClientEvent::SendMessage {
            room_id,
            text,
            image_uri,
        } => {
            if let Err(err) = state
                .pipeline
                .submit(
                    &identity.user_id,
                    &room_id,
                    text.as_deref(),
                    image_uri.as_deref(),
                )
                .await
            {
                warn!(user = %identity.user_id, room = %room_id, error = %err, "message rejected");
                let _ = out_tx.send(ServerEvent::MessageError {
                    detail: err.to_string(),
                });
            }
            Ok(())
        }
        ClientEvent::Typing { room_id, is_typing } => {
            relay_typing(state, identity, &room_id, is_typing).await;
            Ok(())
        }
        ClientEvent::FetchMessages { room_id, page } => {
            fetch_messages(state, &room_id, page, out_tx).await
        }
        ClientEvent::FetchRoom { room_id } => fetch_room(state, &room_id, out_tx).await,
        ClientEvent::FetchRooms => fetch_rooms(state, identity, out_tx).await,
        ClientEvent::FetchUsers => fetch_users(state, out_tx).await,
        ClientEvent::FetchCurrentUser => fetch_current_user(state, identity, out_tx).await,
    };

    if let Err(err) = result {
        debug!(user = %identity.user_id, error = %err, "client event failed");
        let _ = out_tx.send(ServerEvent::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
        });
    }
}

async fn join_room(state: &GatewayState, session_id: &str, room_id: &str) -> GatewayResult<()> {
    let room = resolve_room(state, room_id).await?;
    state.index.subscribe(session_id, room.id).await;
    debug!(session = %session_id, room = %room.public_id, "session joined room");
    Ok(())
}

async fn leave_room(state: &GatewayState, session_id: &str, room_id: &str) -> GatewayResult<()> {
    let room = resolve_room(state, room_id).await?;
    state.index.unsubscribe(session_id, room.id).await;
    debug!(session = %session_id, room = %room.public_id, "session left room");
    Ok(())
}

async fn create_room(
    state: &GatewayState,
    session_id: &str,
    identity: &UserIdentity,
    request: &CreateRoomRequest,
    out_tx: &mpsc::UnboundedSender<ServerEvent>,
) -> GatewayResult<()> {
    let creator = resolve_subject(state, &identity.user_id).await?;
    let room = state.rooms.create_room(creator.id, request).await?;

    // The creator's session follows the new room immediately; other
    // members pick it up when they next connect.
    if let Some(created) = state.rooms.find_room(&room.id).await? {
        state.index.subscribe(session_id, created.id).await;
    }

    let _ = out_tx.send(ServerEvent::RoomCreated { room });
    Ok(())
}

/// Forward a typing signal to everyone else in the room.
///
/// Typing is fire-and-forget: a signal for a room that cannot be resolved
/// is dropped without an error event.
async fn relay_typing(
    state: &GatewayState,
    identity: &UserIdentity,
    room_id: &str,
    is_typing: bool,
) {
    let room = match state.rooms.find_room(room_id).await {
        Ok(Some(room)) => room,
        Ok(None) => {
            debug!(room = %room_id, "typing signal for unknown room dropped");
            return;
        }
        Err(e) => {
            debug!(room = %room_id, error = %e, "typing signal dropped");
            return;
        }
    };

    let event = ServerEvent::UserTyping {
        room_id: room.public_id,
        user_id: identity.user_id.clone(),
        is_typing,
    };
    state
        .broadcast
        .broadcast_except(room.id, &identity.user_id, &event)
        .await;
}

async fn fetch_messages(
    state: &GatewayState,
    room_id: &str,
    page: MessagePage,
    out_tx: &mpsc::UnboundedSender<ServerEvent>,
) -> GatewayResult<()> {
    let room = resolve_room(state, room_id).await?;
    let messages = state.messages.list_messages(room.id, page).await?;

    let _ = out_tx.send(ServerEvent::Messages {
        room_id: room.public_id,
        messages,
    });
    Ok(())
}

async fn fetch_room(
    state: &GatewayState,
    room_id: &str,
    out_tx: &mpsc::UnboundedSender<ServerEvent>,
) -> GatewayResult<()> {
    let room = state.rooms.get_room(room_id).await?;
    let _ = out_tx.send(ServerEvent::Room { room });
    Ok(())
}

async fn fetch_rooms(
    state: &GatewayState,
    identity: &UserIdentity,
    out_tx: &mpsc::UnboundedSender<ServerEvent>,
) -> GatewayResult<()> {
    let user = resolve_subject(state, &identity.user_id).await?;
    let rooms = state.rooms.rooms_for_user(user.id).await?;

    let _ = out_tx.send(ServerEvent::Rooms { rooms });
    Ok(())
}

async fn fetch_users(
    state: &GatewayState,
    out_tx: &mpsc::UnboundedSender<ServerEvent>,
) -> GatewayResult<()> {
    let users = state.directory.list_users().await?;

    let _ = out_tx.send(ServerEvent::Users {
        users: users.into_iter().map(UserView::from).collect(),
    });
    Ok(())
}

async fn fetch_current_user(
    state: &GatewayState,
    identity: &UserIdentity,
    out_tx: &mpsc::UnboundedSender<ServerEvent>,
) -> GatewayResult<()> {
    let user = resolve_subject(state, &identity.user_id).await?;
    let _ = out_tx.send(ServerEvent::CurrentUser {
        user: UserView::from(user),
    });
    Ok(())
}

async fn resolve_room(state: &GatewayState, room_id: &str) -> GatewayResult<Room> {
    state
        .rooms
        .find_room(room_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("Room {} not found", room_id)))
}

async fn resolve_subject(state: &GatewayState, user_id: &str) -> GatewayResult<User> {
    state
        .directory
        .find_by_public_id(user_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("User {} not found", user_id)))
}
