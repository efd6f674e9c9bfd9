//! Response DTOs
//!
//! Resolved messages as delivered to clients, with denormalized sender info.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Message, MessageType, User, UserRole};
use crate::shared::snowflake::id_string;

/// Public sender attributes. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderView {
    #[serde(with = "id_string")]
    pub id: i64,
    pub name: String,
    pub username: String,
    pub profile_picture_ref: Option<String>,
    pub role: UserRole,
}

impl From<User> for SenderView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            profile_picture_ref: user.profile_picture_ref,
            role: user.role,
        }
    }
}

/// A message with its sender resolved, as sent in `newMessage` and
/// `previousMessages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(with = "id_string")]
    pub id: i64,

    #[serde(with = "id_string")]
    pub channel_id: i64,

    #[serde(with = "id_string")]
    pub sender_id: i64,

    /// `None` when the sender account no longer resolves
    pub sender: Option<SenderView>,

    pub message_type: MessageType,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub media_ref: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl MessageView {
    pub fn new(message: Message, sender: Option<SenderView>) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            sender_id: message.sender_id,
            sender,
            message_type: message.message_type,
            text: message.text,
            media_ref: message.media_ref,
            timestamp: message.timestamp,
        }
    }

    /// Resolve a batch of messages against already loaded senders,
    /// keeping the input order.
    pub fn resolve_all(messages: Vec<Message>, senders: Vec<User>) -> Vec<Self> {
        let by_id: HashMap<i64, SenderView> = senders
            .into_iter()
            .map(|user| (user.id, SenderView::from(user)))
            .collect();

        messages
            .into_iter()
            .map(|message| {
                let sender = by_id.get(&message.sender_id).cloned();
                Self::new(message, sender)
            })
            .collect()
    }
}
