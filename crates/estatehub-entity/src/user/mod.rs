//! User domain entities.

pub mod model;
pub mod role;

pub use model::{CreateUser, Identity, User};
pub use role::UserRole;
