//! # estatehub-auth
//!
//! Authentication and authorization core for EstateHub.
//!
//! ## Modules
//!
//! - `password`: Argon2id hashing and the registration password policy
//! - `jwt`: HS256 access/refresh token issuance and validation
//! - `access`: per-route role and ownership decisions
//! - `service`: register, login and refresh flows over an identity store

pub mod access;
pub mod jwt;
pub mod password;
pub mod service;

pub use access::{AccessGuard, AccessPolicy, Action};
pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenPair};
pub use password::{PasswordHasher, PasswordValidator};
pub use service::AuthService;
