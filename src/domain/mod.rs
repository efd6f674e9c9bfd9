//! # Domain Layer
//!
//! Entities of the chat system and the repository contracts that the
//! real-time layer consumes.
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts
//! - Entities enforce their own invariants (e.g. one payload per message)

pub mod entities;

pub use entities::*;
