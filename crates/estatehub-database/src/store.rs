//! Store traits consumed by the auth core and the HTTP layer.
//!
//! Components receive an `Arc<dyn IdentityStore>` / `Arc<dyn ResourceStore>`
//! at construction; nothing reaches for a global connection.

use async_trait::async_trait;

use estatehub_core::result::AppResult;
use estatehub_entity::resource::{ResourceKind, ResourcePayload, ResourceRecord};
use estatehub_entity::user::{CreateUser, Identity, User};

/// What the login flow needs to know about an account.
#[derive(Debug, Clone)]
pub struct StoredCredential {
    /// Account id and role.
    pub identity: Identity,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Whether the account may log in.
    pub is_active: bool,
}

/// Accounts and roles.
#[async_trait]
pub trait IdentityStore: Send + Sync + 'static {
    /// Resolve a role name to its `roles.id`. `NotFound` if unknown.
    async fn find_role_by_name(&self, name: &str) -> AppResult<i32>;

    /// Look an account up by username or email (case-insensitive).
    /// `NotFound` if neither matches.
    async fn find_identity_by_login_identifier(
        &self,
        identifier: &str,
    ) -> AppResult<StoredCredential>;

    /// Look an account up by id. `NotFound` if absent.
    async fn find_identity_by_id(&self, id: i64) -> AppResult<Identity>;

    /// Whether the username or email is already registered.
    async fn login_taken(&self, username: &str, email: &str) -> AppResult<bool>;

    /// Insert a new account. `Conflict` on a duplicate username or email.
    async fn create_user(&self, user: CreateUser) -> AppResult<User>;
}

/// Owned collections addressed through [`ResourceKind`].
#[async_trait]
pub trait ResourceStore: Send + Sync + 'static {
    /// Owner of a record (0 = unowned). `NotFound` if the id does not exist.
    async fn get_owner_id(&self, kind: ResourceKind, id: i64) -> AppResult<i64>;

    /// Every record of a collection, newest first.
    async fn list(&self, kind: ResourceKind) -> AppResult<Vec<ResourceRecord>>;

    /// Records owned by one account.
    async fn list_owned(&self, kind: ResourceKind, owner_id: i64) -> AppResult<Vec<ResourceRecord>>;

    /// A single record. `NotFound` if absent.
    async fn find(&self, kind: ResourceKind, id: i64) -> AppResult<ResourceRecord>;

    /// Insert a record owned by `owner_id`.
    async fn insert(&self, payload: &ResourcePayload, owner_id: i64) -> AppResult<ResourceRecord>;

    /// Overwrite the writable columns of a record. `NotFound` if absent.
    async fn update(&self, id: i64, payload: &ResourcePayload) -> AppResult<ResourceRecord>;

    /// Delete a record. `NotFound` if absent.
    async fn delete(&self, kind: ResourceKind, id: i64) -> AppResult<()>;
}
