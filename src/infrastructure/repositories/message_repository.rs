//! Message Repository Implementation
//!
//! PostgreSQL implementation of message storage. Only messages referenced
//! by their channel's log are visible to history queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Message, MessageRepository, MessageType};
use crate::shared::error::AppError;

/// PostgreSQL message repository implementation.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for message queries.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    channel_id: i64,
    sender_id: i64,
    message_type: String,
    text: Option<String>,
    media_ref: Option<String>,
    timestamp: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> Result<Message, AppError> {
        let message_type = MessageType::parse(&self.message_type).ok_or_else(|| {
            AppError::Internal(format!(
                "Unknown message type '{}' on message {}",
                self.message_type, self.id
            ))
        })?;

        Ok(Message {
            id: self.id,
            channel_id: self.channel_id,
            sender_id: self.sender_id,
            message_type,
            text: self.text,
            media_ref: self.media_ref,
            timestamp: self.timestamp,
        })
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, message: &Message) -> Result<i64, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO messages (id, channel_id, sender_id, message_type, text, media_ref, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(message.id)
        .bind(message.channel_id)
        .bind(message.sender_id)
        .bind(message.message_type.as_str())
        .bind(&message.text)
        .bind(&message.media_ref)
        .bind(message.timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Ties on timestamp are broken by id, which is time-ordered too.
    async fn find_recent_by_channel(
        &self,
        channel_id: i64,
        limit: usize,
    ) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.channel_id, m.sender_id, m.message_type,
                   m.text, m.media_ref, m.timestamp
            FROM messages m
            JOIN channel_messages cm
              ON cm.message_id = m.id AND cm.channel_id = m.channel_id
            WHERE m.channel_id = $1
            ORDER BY m.timestamp DESC, m.id DESC
            LIMIT $2
            "#,
        )
        .bind(channel_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }
}
