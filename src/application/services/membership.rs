//! Room Membership Service
//!
//! Gates joins against the persisted banned set, then subscribes the
//! session and replays history to it alone.

use std::sync::Arc;

use crate::application::realtime::{ConnectionId, ServerEvent, SessionRegistry};
use crate::domain::ChannelRepository;
use crate::infrastructure::metrics;
use crate::shared::error::GatewayError;

use super::history::HistoryReplayService;

pub const BANNED_REASON: &str = "You are banned from this channel.";

pub struct RoomMembershipService {
    channels: Arc<dyn ChannelRepository>,
    registry: Arc<SessionRegistry>,
    history: HistoryReplayService,
}

impl RoomMembershipService {
    pub fn new(
        channels: Arc<dyn ChannelRepository>,
        registry: Arc<SessionRegistry>,
        history: HistoryReplayService,
    ) -> Self {
        Self {
            channels,
            registry,
            history,
        }
    }

    /// Join a channel room and replay its recent history to this session.
    ///
    /// Re-joining a room the session is already in only replays history
    /// again. Returns the number of replayed messages.
    pub async fn join_channel(
        &self,
        connection_id: ConnectionId,
        channel_id: i64,
        user_id: i64,
    ) -> Result<usize, GatewayError> {
        let channel = self
            .channels
            .find_by_id(channel_id)
            .await
            .map_err(GatewayError::persistence("joining the channel"))?
            .ok_or(GatewayError::ChannelNotFound(channel_id))?;

        if channel.is_banned(user_id) {
            metrics::record_join("banned");
            tracing::info!(
                connection_id = %connection_id,
                user_id,
                channel_id,
                "Join rejected: user is banned"
            );
            return Err(GatewayError::Forbidden(BANNED_REASON));
        }

        if !self.registry.add_to_room(connection_id, channel_id) {
            return Err(GatewayError::SessionClosed);
        }

        tracing::info!(
            connection_id = %connection_id,
            user_id,
            channel_id,
            "User joined channel"
        );
        metrics::record_join("joined");

        let history = self.history.replay(channel_id).await?;
        let replayed = history.len();
        self.registry
            .send_to(connection_id, ServerEvent::PreviousMessages(history));

        Ok(replayed)
    }
}
