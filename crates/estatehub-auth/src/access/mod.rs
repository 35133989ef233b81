//! Per-route authorization: a role-gate from [`AccessPolicy`] and an
//! ownership check enforced by [`AccessGuard`].

pub mod guard;
pub mod policy;

pub use guard::AccessGuard;
pub use policy::{AccessPolicy, AccessRule, Action};
