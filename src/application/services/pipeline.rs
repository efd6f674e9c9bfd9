//! Message Ingestion & Broadcast Pipeline
//!
//! The single path by which a new message, typed live or uploaded as media,
//! is persisted and fanned out to the channel room.
//!
//! Persistence is two independent writes: the message row, then the
//! channel's reference log. A failure between them leaves an orphaned
//! message that history replay never shows; nothing is broadcast in that
//! case.

use std::sync::Arc;

use chrono::Utc;

use crate::application::dto::{MessageView, SenderView};
use crate::application::realtime::{ConnectionId, ServerEvent, SessionRegistry};
use crate::domain::{Message, MessageType};
use crate::infrastructure::metrics;
use crate::shared::error::GatewayError;
use crate::shared::snowflake::SnowflakeGenerator;

use super::membership::BANNED_REASON;
use super::Repositories;

pub const NOT_JOINED_REASON: &str = "You have not joined this channel.";

/// Where a message entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Typed by a live session; the session must be in the room
    Session(ConnectionId),
    /// Produced by the media upload handler
    Upload,
}

/// A message as submitted, before it has an id or a timestamp.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub channel_id: i64,
    pub sender_id: i64,
    pub message_type: MessageType,
    pub text: Option<String>,
    pub media_ref: Option<String>,
}

pub struct MessagePipeline {
    repos: Repositories,
    registry: Arc<SessionRegistry>,
    ids: Arc<SnowflakeGenerator>,
}

impl MessagePipeline {
    pub fn new(
        repos: Repositories,
        registry: Arc<SessionRegistry>,
        ids: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            repos,
            registry,
            ids,
        }
    }

    /// Validate, timestamp, persist and broadcast one message.
    ///
    /// The broadcast reaches every session in the room, the sender's own
    /// included. Returns the resolved message as it was broadcast.
    pub async fn ingest(
        &self,
        origin: Origin,
        request: IngestRequest,
    ) -> Result<MessageView, GatewayError> {
        let channel_id = request.channel_id;
        let sender_id = request.sender_id;

        if let Origin::Session(connection_id) = origin {
            if !self.registry.is_in_room(connection_id, channel_id) {
                return Err(GatewayError::Forbidden(NOT_JOINED_REASON));
            }
        }

        let channel = self
            .repos
            .channels
            .find_by_id(channel_id)
            .await
            .map_err(GatewayError::persistence("sending the message"))?
            .ok_or(GatewayError::ChannelNotFound(channel_id))?;

        if channel.is_banned(sender_id) {
            if let Origin::Session(connection_id) = origin {
                self.registry.remove_from_room(connection_id, channel_id);
            }
            tracing::info!(sender_id, channel_id, "Message rejected: sender is banned");
            return Err(GatewayError::Forbidden(BANNED_REASON));
        }

        let message = Message::compose(
            self.ids.generate(),
            channel_id,
            sender_id,
            request.message_type,
            request.text,
            request.media_ref,
            Utc::now(),
        )
        .map_err(|e| GatewayError::Invalid(e.to_string()))?;

        let message_id = self
            .repos
            .messages
            .insert(&message)
            .await
            .map_err(GatewayError::persistence("sending the message"))?;

        if let Err(e) = self.repos.channels.append_message(channel_id, message_id).await {
            tracing::warn!(
                message_id,
                channel_id,
                "Message persisted but not referenced by its channel"
            );
            return Err(GatewayError::persistence("sending the message")(e));
        }

        // The message is durable at this point; a failed sender lookup only
        // costs the denormalized sender info.
        let sender = match self.repos.users.find_by_id(sender_id).await {
            Ok(user) => user.map(SenderView::from),
            Err(e) => {
                tracing::warn!(sender_id, error = %e, "Sender lookup failed");
                None
            }
        };

        let view = MessageView::new(message, sender);
        let delivery = self.registry.broadcast(
            channel_id,
            &ServerEvent::NewMessage(view.clone()),
            None,
            &channel.banned_user_ids,
        );

        metrics::record_ingest(view.message_type.as_str());
        tracing::info!(
            message_id,
            channel_id,
            sender_id,
            message_type = %view.message_type,
            origin = ?origin,
            delivered = delivery.delivered,
            evicted = delivery.evicted.len(),
            "Message broadcast"
        );

        Ok(view)
    }
}
