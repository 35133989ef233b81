//! # estatehub-database
//!
//! Identity and resource stores for EstateHub. The traits in [`store`] are
//! the only surface the auth core and the HTTP layer see; [`repositories`]
//! implements them over PostgreSQL and [`memory`] implements them in-process.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use migration::run_migrations;
pub use store::{IdentityStore, ResourceStore, StoredCredential};
