//! Application Services
//!
//! The real-time messaging core.
//!
//! ## Available Services
//!
//! - **RoomMembershipService**: ban-gated joins
//! - **HistoryReplayService**: bounded, ordered history for a joining session
//! - **MessagePipeline**: persist-then-broadcast path for every new message
//! - **SignallingRelay**: peer handshake pass-through
//! - **MediaBridge**: uploaded files entering the message pipeline

pub mod history;
pub mod media;
pub mod membership;
pub mod pipeline;
pub mod signalling;

use std::sync::Arc;

use crate::domain::{ChannelRepository, MessageRepository, UserRepository};

pub use history::HistoryReplayService;
pub use media::{MediaBridge, MediaUpload};
pub use membership::{RoomMembershipService, BANNED_REASON};
pub use pipeline::{IngestRequest, MessagePipeline, Origin, NOT_JOINED_REASON};
pub use signalling::SignallingRelay;

/// The external stores the messaging core reads and writes.
#[derive(Clone)]
pub struct Repositories {
    pub channels: Arc<dyn ChannelRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub users: Arc<dyn UserRepository>,
}
