//! Channel Repository Implementation
//!
//! PostgreSQL implementation of the ChannelRepository trait.
//! A channel is loaded from `channels` and `channel_bans`; its ordered
//! reference log in `channel_messages` is only ever appended to here.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Channel, ChannelRepository};
use crate::shared::error::AppError;

/// Database row representation of the channels table.
#[derive(Debug, sqlx::FromRow)]
struct ChannelRow {
    id: i64,
    name: String,
    description: Option<String>,
    group_id: Option<i64>,
}

impl ChannelRow {
    fn into_channel(self, banned: Vec<i64>) -> Channel {
        Channel {
            id: self.id,
            name: self.name,
            description: self.description,
            group_id: self.group_id,
            banned_user_ids: banned.into_iter().collect(),
        }
    }
}

/// PostgreSQL channel repository implementation.
#[derive(Clone)]
pub struct PgChannelRepository {
    pool: PgPool,
}

impl PgChannelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelRepository for PgChannelRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Channel>, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT id, name, description, group_id
            FROM channels
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let banned: Vec<i64> =
            sqlx::query_scalar("SELECT user_id FROM channel_bans WHERE channel_id = $1")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(row.into_channel(banned)))
    }

    async fn save(&self, channel: &Channel) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO channels (id, name, description, group_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                group_id = EXCLUDED.group_id
            "#,
        )
        .bind(channel.id)
        .bind(&channel.name)
        .bind(&channel.description)
        .bind(channel.group_id)
        .execute(&mut *tx)
        .await?;

        let banned: Vec<i64> = channel.banned_user_ids.iter().copied().collect();
        sqlx::query("DELETE FROM channel_bans WHERE channel_id = $1 AND NOT (user_id = ANY($2))")
            .bind(channel.id)
            .bind(&banned)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO channel_bans (channel_id, user_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(channel.id)
        .bind(&banned)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Single-statement append; concurrent appends never lose references.
    async fn append_message(&self, channel_id: i64, message_id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO channel_messages (channel_id, message_id)
            SELECT id, $2 FROM channels WHERE id = $1
            ON CONFLICT (channel_id, message_id) DO NOTHING
            "#,
        )
        .bind(channel_id)
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM channels WHERE id = $1)")
                    .bind(channel_id)
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                return Err(AppError::NotFound(format!("Channel {} not found", channel_id)));
            }
        }

        Ok(())
    }
}
