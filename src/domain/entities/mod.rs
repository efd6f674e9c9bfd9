//! # Domain Entities
//!
//! Core domain entities of the group chat backend.
//!
//! - **User**: a chat participant, resolved from a static bearer token
//! - **Channel**: a conversation space inside a group, with a banned-user set
//!   and an ordered log of message references
//! - **Message**: an immutable text or media message
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining the data access
//! the messaging layer consumes. Implementations live in the infrastructure
//! layer (PostgreSQL and in-memory).

mod channel;
mod message;
mod user;

pub use channel::{Channel, ChannelRepository};
pub use message::{ContentError, Message, MessageRepository, MessageType};
pub use user::{User, UserRepository, UserRole};
