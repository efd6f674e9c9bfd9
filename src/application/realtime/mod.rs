//! Real-time Session State
//!
//! Connection identities, the gateway event vocabulary and the Session
//! Registry that turns channel ids into broadcast rooms.

pub mod events;
pub mod registry;

pub use events::{ClientEvent, ConnectionId, PeerSignal, ServerEvent};
pub use registry::{Delivery, SessionRegistry};
