//! Request DTOs
//!
//! Payloads of the inbound gateway events.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::MessageType;
use crate::shared::snowflake::id_string;

/// `joinChannel` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinChannelRequest {
    #[serde(with = "id_string")]
    pub channel_id: i64,

    /// Claimed identity; must match the session's identity when present
    #[serde(default, with = "id_string::option")]
    pub user_id: Option<i64>,
}

/// `sendMessage` payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(with = "id_string")]
    pub channel_id: i64,

    #[serde(default, with = "id_string::option")]
    pub user_id: Option<i64>,

    pub message_type: MessageType,

    #[serde(default)]
    #[validate(length(max = 4000, message = "Message text must be at most 4000 characters"))]
    pub text: Option<String>,

    #[serde(default)]
    #[validate(length(max = 2048, message = "Media reference is too long"))]
    pub media_ref: Option<String>,
}

/// `peerConnected` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerConnectedRequest {
    /// Opaque handshake identifier, relayed untouched
    pub peer_id: serde_json::Value,

    #[serde(with = "id_string")]
    pub channel_id: i64,
}
