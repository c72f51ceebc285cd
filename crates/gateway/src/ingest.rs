//! Message ingestion pipeline.
//!
//! A submission moves through validation, optional image storage,
//! persistence, a room summary refresh, and finally fan-out. Anything that
//! fails before the message row exists rejects the whole submission; a
//! failed summary refresh is logged and tolerated since the row is already
//! durable, and fan-out failures are the broadcast engine's problem.

use tracing::{debug, warn};

use courier_rooms::{MediaStore, MessageService, MessageView, RoomService};
use courier_users::UserDirectory;

use crate::broadcast::BroadcastEngine;
use crate::error::{GatewayError, GatewayResult};
use crate::websocket::events::ServerEvent;

/// Body persisted for an image post that carries no caption.
const IMAGE_PLACEHOLDER: &str = "Image";

/// Takes submitted messages from validation through broadcast.
#[derive(Clone)]
pub struct MessagePipeline {
    directory: UserDirectory,
    rooms: RoomService,
    messages: MessageService,
    media: MediaStore,
    broadcast: BroadcastEngine,
}

impl MessagePipeline {
    pub fn new(
        directory: UserDirectory,
        rooms: RoomService,
        messages: MessageService,
        media: MediaStore,
        broadcast: BroadcastEngine,
    ) -> Self {
        Self {
            directory,
            rooms,
            messages,
            media,
            broadcast,
        }
    }

    /// Accept one message for a room.
    ///
    /// On success the stored message has already been fanned out to every
    /// member with a live session, the submitter included.
    pub async fn submit(
        &self,
        author_id: &str,
        room_id: &str,
        text: Option<&str>,
        image_uri: Option<&str>,
    ) -> GatewayResult<MessageView> {
        let room = self
            .rooms
            .find_room(room_id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("Room {} not found", room_id)))?;

        let author = self
            .directory
            .find_by_public_id(author_id)
            .await?
            .ok_or_else(|| {
                GatewayError::Validation(format!("Author {} is not a known user", author_id))
            })?;

        let trimmed = text.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() && image_uri.is_none() {
            return Err(GatewayError::Validation(
                "Message text must not be empty".to_string(),
            ));
        }

        // Image payloads hit storage before anything is persisted; a
        // storage failure rejects the submission with no message row.
        let image_url = match image_uri {
            Some(payload) => Some(self.media.store(payload, author.id).await?),
            None => None,
        };

        let body = if trimmed.is_empty() {
            IMAGE_PLACEHOLDER
        } else {
            trimmed
        };

        let message = self
            .messages
            .create_message(room.id, author.id, body, image_url.as_deref())
            .await?;

        // The room summary trails the message row; if this write fails the
        // message stands and the summary catches up on the next one.
        if let Err(e) = self
            .messages
            .update_room_summary(room.id, body, &message.created_at)
            .await
        {
            warn!(room = %room.public_id, error = %e, "failed to refresh room summary");
        }

        debug!(
            message = %message.id,
            room = %room.public_id,
            author = %author.public_id,
            "message accepted"
        );

        self.broadcast
            .broadcast(
                room.id,
                &ServerEvent::NewMessage {
                    message: message.clone(),
                },
            )
            .await;

        Ok(message)
    }
}
