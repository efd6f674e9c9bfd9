//! History Replay Service
//!
//! Gives a newly joined session a bounded window of the conversation.

use std::collections::BTreeSet;

use crate::application::dto::MessageView;
use crate::shared::error::GatewayError;

use super::Repositories;

pub struct HistoryReplayService {
    repos: Repositories,
    limit: usize,
}

impl HistoryReplayService {
    pub fn new(repos: Repositories, limit: usize) -> Self {
        Self { repos, limit }
    }

    /// The most recent `limit` messages of a channel, oldest first, with
    /// senders resolved.
    ///
    /// A point-in-time read of an append-only log: a message sent while this
    /// runs may be missing from the snapshot and arrives through the live
    /// broadcast instead.
    pub async fn replay(&self, channel_id: i64) -> Result<Vec<MessageView>, GatewayError> {
        let mut messages = self
            .repos
            .messages
            .find_recent_by_channel(channel_id, self.limit)
            .await
            .map_err(GatewayError::persistence("joining the channel"))?;

        messages.truncate(self.limit);
        messages.reverse();

        let sender_ids: Vec<i64> = messages
            .iter()
            .map(|m| m.sender_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let senders = if sender_ids.is_empty() {
            Vec::new()
        } else {
            self.repos
                .users
                .find_by_ids(&sender_ids)
                .await
                .map_err(GatewayError::persistence("joining the channel"))?
        };

        tracing::debug!(channel_id, replayed = messages.len(), "History snapshot loaded");
        Ok(MessageView::resolve_all(messages, senders))
    }
}
