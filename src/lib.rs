//! # Group Chat Server Library
//!
//! Real-time group chat over WebSocket:
//! - Channel rooms with ban-gated joins
//! - Bounded history replay for joining sessions
//! - A single persist-then-broadcast path for text and media messages
//! - Peer-connection signalling relay
//! - PostgreSQL or in-memory storage
//!
//! ## Architecture
//!
//! - **Domain Layer**: Entities and repository traits
//! - **Application Layer**: Session registry, messaging services and DTOs
//! - **Infrastructure Layer**: Repositories, media storage, metrics
//! - **Presentation Layer**: HTTP handlers and WebSocket gateway
//!
//! ## Module Structure
//!
//! ```text
//! groupchat_server/
//! +-- config/         Configuration management
//! +-- domain/         Entities and repository traits
//! +-- application/    Session registry, services and DTOs
//! +-- infrastructure/ Database, in-memory store, media storage, metrics
//! +-- presentation/   HTTP routes and WebSocket handlers
//! +-- shared/         Common utilities (errors, snowflake IDs)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core entities
pub mod domain;

// Application layer - Messaging services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
