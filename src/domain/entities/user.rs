//! User entity and repository trait.
//!
//! Maps to the `users` table in the database schema. Only the attributes the
//! messaging layer needs are loaded; credentials never leave the repository.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// User role matching the `users.role` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    ChatUser,
    GroupAdmin,
    SuperAdmin,
}

impl UserRole {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "group_admin" => Self::GroupAdmin,
            "super_admin" => Self::SuperAdmin,
            _ => Self::ChatUser,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChatUser => "chat_user",
            Self::GroupAdmin => "group_admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a user account in the chat system.
///
/// Maps to the `users` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - name: TEXT NOT NULL
/// - username: TEXT NOT NULL UNIQUE
/// - token: TEXT NOT NULL UNIQUE (static bearer token, not loaded)
/// - profile_picture_ref: TEXT NULL
/// - bio: TEXT NULL
/// - role: TEXT NOT NULL DEFAULT 'chat_user'
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub profile_picture_ref: Option<String>,
    pub bio: Option<String>,
    pub role: UserRole,
}

impl User {
    pub fn new(id: i64, name: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            username: username.into(),
            profile_picture_ref: None,
            bio: None,
            role: UserRole::default(),
        }
    }
}

/// Repository trait for User lookups used by the messaging layer.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Find several users at once. Unknown IDs are skipped.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, AppError>;

    /// Resolve an opaque static bearer token to its user.
    async fn find_by_token(&self, token: &str) -> Result<Option<User>, AppError>;
}
