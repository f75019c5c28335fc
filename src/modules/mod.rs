//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the HTTP transport and the user-facing notification sink.

pub mod http;
pub mod notify;
