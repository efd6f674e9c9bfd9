//! Message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Message kinds matching the `messages.message_type` CHECK constraint.
///
/// A text message carries inline text; every other kind carries a media
/// reference produced by the upload handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Video,
    Audio,
}

impl MessageType {
    /// Convert from database/wire string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }

    /// Infer the media kind from a MIME type (`image/png` -> Image).
    pub fn from_mime(mime: &str) -> Option<Self> {
        let top_level = mime.split('/').next()?.trim().to_lowercase();
        match top_level.as_str() {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn is_media(&self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a message body does not match its declared type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("Text messages require non-empty text.")]
    MissingText,

    #[error("Media messages require a media reference.")]
    MissingMediaRef,
}

/// A persisted chat message. Immutable once created.
///
/// Exactly one of `text` / `media_ref` is populated, selected by
/// `message_type`. Construct through [`Message::compose`].
///
/// Maps to the `messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - channel_id: BIGINT NOT NULL REFERENCES channels(id)
/// - sender_id: BIGINT NOT NULL
/// - message_type: TEXT NOT NULL
/// - text: TEXT NULL
/// - media_ref: TEXT NULL
/// - timestamp: TIMESTAMPTZ NOT NULL (server-assigned)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub channel_id: i64,
    pub sender_id: i64,
    pub message_type: MessageType,
    pub text: Option<String>,
    pub media_ref: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Build a message, keeping only the payload field its type calls for.
    pub fn compose(
        id: i64,
        channel_id: i64,
        sender_id: i64,
        message_type: MessageType,
        text: Option<String>,
        media_ref: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ContentError> {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let (text, media_ref) = if message_type.is_media() {
            let media_ref = non_blank(media_ref).ok_or(ContentError::MissingMediaRef)?;
            (None, Some(media_ref))
        } else {
            let text = non_blank(text).ok_or(ContentError::MissingText)?;
            (Some(text), None)
        };

        Ok(Self {
            id,
            channel_id,
            sender_id,
            message_type,
            text,
            media_ref,
            timestamp,
        })
    }
}

/// Repository trait for Message data access operations.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert a new message and return its persisted ID.
    async fn insert(&self, message: &Message) -> Result<i64, AppError>;

    /// The `limit` most recent messages of a channel, newest first.
    async fn find_recent_by_channel(
        &self,
        channel_id: i64,
        limit: usize,
    ) -> Result<Vec<Message>, AppError>;
}
