//! Data Transfer Objects
//!
//! Wire payloads of the gateway events.

pub mod request;
pub mod response;

pub use request::{JoinChannelRequest, PeerConnectedRequest, SendMessageRequest};
pub use response::{MessageView, SenderView};
