//! WebSocket Gateway
//!
//! Real-time communication via WebSocket connections.

pub mod gateway;
pub mod handler;
pub mod session;

pub use gateway::Gateway;
pub use handler::ws_handler;
pub use session::spawn_session_worker;
