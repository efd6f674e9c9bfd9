//! Channel entity and repository trait.
//!
//! Maps to the `channels` and `channel_bans` tables. The channel's ordered
//! message log (`channel_messages`) is append-only and reached through
//! [`ChannelRepository::append_message`] and history queries, so loading a
//! channel never reads it.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A chat channel belonging to a group.
///
/// `banned_user_ids` gates joining, sending and receiving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Display name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Owning group (groups are managed elsewhere)
    pub group_id: Option<i64>,

    /// Users who may neither join nor send
    pub banned_user_ids: HashSet<i64>,
}

impl Channel {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            group_id: None,
            banned_user_ids: HashSet::new(),
        }
    }

    /// Check whether a user is banned from this channel.
    pub fn is_banned(&self, user_id: i64) -> bool {
        self.banned_user_ids.contains(&user_id)
    }

    /// Ban a user. Returns false if they were already banned.
    pub fn ban(&mut self, user_id: i64) -> bool {
        self.banned_user_ids.insert(user_id)
    }
}

/// Repository trait for Channel data access operations.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// Find a channel by ID together with its banned set.
    async fn find_by_id(&self, id: i64) -> Result<Option<Channel>, AppError>;

    /// Persist channel metadata and replace its banned set. The message log
    /// is left untouched.
    async fn save(&self, channel: &Channel) -> Result<(), AppError>;

    /// Append one message reference to the end of a channel's log.
    ///
    /// Appending a reference that is already present is a no-op. Fails with
    /// `NotFound` for an unknown channel.
    async fn append_message(&self, channel_id: i64, message_id: i64) -> Result<(), AppError>;
}
