//! Application Layer
//!
//! The real-time messaging core: session state, the services that act on
//! it, and the DTOs that cross the wire.

pub mod dto;
pub mod realtime;
pub mod services;
