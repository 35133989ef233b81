//! Custom Axum extractors.

pub mod auth;
pub mod json;
pub mod resource;

pub use auth::{AuthContext, AuthUser};
pub use json::{ApiJson, ValidatedJson};
pub use resource::ResourceTarget;
