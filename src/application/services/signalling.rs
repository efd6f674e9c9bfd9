//! Signalling Relay
//!
//! Best-effort pass-through of peer-connection handshake payloads to the
//! other members of a room. Nothing is persisted.

use std::collections::HashSet;
use std::sync::Arc;

use crate::application::realtime::{ConnectionId, PeerSignal, ServerEvent, SessionRegistry};
use crate::infrastructure::metrics;

pub struct SignallingRelay {
    registry: Arc<SessionRegistry>,
}

impl SignallingRelay {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Relay `peer_id` to every session in the room except the originator.
    ///
    /// Dropped silently when the originator is not in the room or nobody
    /// else is. Returns the number of recipients.
    pub fn relay(
        &self,
        channel_id: i64,
        peer_id: serde_json::Value,
        origin: ConnectionId,
    ) -> usize {
        if !self.registry.is_in_room(origin, channel_id) {
            tracing::debug!(
                connection_id = %origin,
                channel_id,
                "Signal dropped: originator is not in the room"
            );
            return 0;
        }

        let delivery = self.registry.broadcast(
            channel_id,
            &ServerEvent::PeerConnected(PeerSignal { peer_id }),
            Some(origin),
            &HashSet::new(),
        );

        metrics::record_relay(delivery.delivered);
        tracing::debug!(
            connection_id = %origin,
            channel_id,
            delivered = delivery.delivered,
            "Signal relayed"
        );
        delivery.delivered
    }
}
