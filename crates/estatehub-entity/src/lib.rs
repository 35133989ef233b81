//! # estatehub-entity
//!
//! Domain entity models for EstateHub. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities derive `sqlx::FromRow`.

pub mod property;
pub mod purchase;
pub mod resource;
pub mod sale;
pub mod user;

pub use property::Property;
pub use purchase::Purchase;
pub use resource::{ResourceKind, ResourcePayload, ResourceRecord, UNOWNED};
pub use sale::Sale;
pub use user::{Identity, User, UserRole};
