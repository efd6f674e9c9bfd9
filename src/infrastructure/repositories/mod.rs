//! Repository Implementations
//!
//! Concrete implementations of the repository traits defined in the domain
//! layer.
//!
//! ## Available Repositories
//!
//! - **PgUserRepository** - User lookups by id and bearer token
//! - **PgChannelRepository** - Channel metadata, bans and reference log
//! - **PgMessageRepository** - Message storage and recent-history queries
//! - **MemoryStore** - All three traits over process memory
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::repositories::{
//!     PgChannelRepository, PgMessageRepository, PgUserRepository,
//! };
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let user_repo = PgUserRepository::new(pool.clone());
//!     let channel_repo = PgChannelRepository::new(pool.clone());
//!     let message_repo = PgMessageRepository::new(pool);
//! }
//! ```

pub mod channel_repository;
pub mod memory;
pub mod message_repository;
pub mod user_repository;

pub use channel_repository::PgChannelRepository;
pub use memory::MemoryStore;
pub use message_repository::PgMessageRepository;
pub use user_repository::PgUserRepository;
