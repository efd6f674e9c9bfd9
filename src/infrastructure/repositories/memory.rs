//! In-Memory Repository Implementation
//!
//! A process-local store implementing every repository trait. Used by the
//! `memory` storage backend and by tests; nothing survives a restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{
    Channel, ChannelRepository, Message, MessageRepository, User, UserRepository,
};
use crate::shared::error::AppError;

#[derive(Default)]
struct MemoryState {
    users: HashMap<i64, User>,
    tokens: HashMap<String, i64>,
    channels: HashMap<i64, Channel>,
    /// Per-channel message log, oldest first
    references: HashMap<i64, Vec<i64>>,
    messages: HashMap<i64, Message>,
}

/// Shared handle; clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user together with their bearer token.
    pub fn insert_user(&self, user: User, token: impl Into<String>) {
        let mut state = self.state.write();
        state.tokens.retain(|_, id| *id != user.id);
        state.tokens.insert(token.into(), user.id);
        state.users.insert(user.id, user);
    }

    /// Add or replace a channel.
    pub fn insert_channel(&self, channel: Channel) {
        self.state.write().channels.insert(channel.id, channel);
    }

    /// Ban a user from a channel. Returns false if the channel is unknown.
    pub fn ban_user(&self, channel_id: i64, user_id: i64) -> bool {
        match self.state.write().channels.get_mut(&channel_id) {
            Some(channel) => {
                channel.ban(user_id);
                true
            }
            None => false,
        }
    }

    /// Total stored messages, including any not referenced by a channel.
    pub fn message_count(&self) -> usize {
        self.state.read().messages.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, AppError> {
        let state = self.state.read();
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read();
        Ok(state
            .tokens
            .get(token)
            .and_then(|id| state.users.get(id))
            .cloned())
    }
}

#[async_trait]
impl ChannelRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Channel>, AppError> {
        Ok(self.state.read().channels.get(&id).cloned())
    }

    async fn save(&self, channel: &Channel) -> Result<(), AppError> {
        self.insert_channel(channel.clone());
        Ok(())
    }

    async fn append_message(&self, channel_id: i64, message_id: i64) -> Result<(), AppError> {
        let mut state = self.state.write();
        if !state.channels.contains_key(&channel_id) {
            return Err(AppError::NotFound(format!("Channel {} not found", channel_id)));
        }
        let log = state.references.entry(channel_id).or_default();
        if !log.contains(&message_id) {
            log.push(message_id);
        }
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn insert(&self, message: &Message) -> Result<i64, AppError> {
        let mut state = self.state.write();
        if state.messages.contains_key(&message.id) {
            return Err(AppError::BadRequest(format!(
                "Message {} already exists",
                message.id
            )));
        }
        state.messages.insert(message.id, message.clone());
        Ok(message.id)
    }

    async fn find_recent_by_channel(
        &self,
        channel_id: i64,
        limit: usize,
    ) -> Result<Vec<Message>, AppError> {
        let state = self.state.read();
        let Some(log) = state.references.get(&channel_id) else {
            return Ok(Vec::new());
        };

        let mut messages: Vec<Message> = log
            .iter()
            .filter_map(|id| state.messages.get(id))
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect();

        messages.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        messages.truncate(limit);
        Ok(messages)
    }
}
