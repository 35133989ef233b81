//! Axum middleware stack.

pub mod access;
pub mod auth;
pub mod cors;
pub mod logging;
