//! Gateway Event Types
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::dto::{
    JoinChannelRequest, MessageView, PeerConnectedRequest, SendMessageRequest,
};

/// Opaque identifier of one live transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inbound events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinChannel(JoinChannelRequest),
    SendMessage(SendMessageRequest),
    PeerConnected(PeerConnectedRequest),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinChannel(_) => "joinChannel",
            ClientEvent::SendMessage(_) => "sendMessage",
            ClientEvent::PeerConnected(_) => "peerConnected",
        }
    }
}

/// Relayed signalling payload, without the routing channel id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSignal {
    pub peer_id: serde_json::Value,
}

/// Outbound events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// History batch for a newly joined session, oldest first
    PreviousMessages(Vec<MessageView>),
    /// A message fanned out to a whole room, sender included
    NewMessage(MessageView),
    PeerConnected(PeerSignal),
    /// Short human-readable failure reason, sent to the caller only
    Error(String),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::PreviousMessages(_) => "previousMessages",
            ServerEvent::NewMessage(_) => "newMessage",
            ServerEvent::PeerConnected(_) => "peerConnected",
            ServerEvent::Error(_) => "error",
        }
    }
}
