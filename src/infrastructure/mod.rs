//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database pool and migrations (PostgreSQL)
//! - Repository implementations (PostgreSQL and in-memory)
//! - Media file storage
//! - Prometheus metrics

pub mod database;
pub mod media;
pub mod metrics;
pub mod repositories;
