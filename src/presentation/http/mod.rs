//! HTTP Surface
//!
//! Health, metrics and media upload routes.

pub mod handlers;
pub mod routes;
