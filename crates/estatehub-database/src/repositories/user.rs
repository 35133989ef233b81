//! User repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use estatehub_core::error::AppError;
use estatehub_core::result::AppResult;
use estatehub_entity::user::{CreateUser, Identity, User};

use super::map_db_error;
use crate::store::{IdentityStore, StoredCredential};

/// Repository for accounts and roles.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find user by id"))
    }

    /// Find a user by username or email (case-insensitive).
    pub async fn find_by_login(&self, identifier: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1) \
             ORDER BY id LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error("Failed to find user by login"))
    }
}

fn identity_of(user: &User) -> AppResult<Identity> {
    user.identity().ok_or_else(|| {
        AppError::internal(format!(
            "User {} has unknown role id {}",
            user.id, user.role_id
        ))
    })
}

#[async_trait]
impl IdentityStore for UserRepository {
    async fn find_role_by_name(&self, name: &str) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>("SELECT id FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find role"))?
            .ok_or_else(|| AppError::not_found(format!("Role '{name}' not found")))
    }

    async fn find_identity_by_login_identifier(
        &self,
        identifier: &str,
    ) -> AppResult<StoredCredential> {
        let user = self
            .find_by_login(identifier)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        Ok(StoredCredential {
            identity: identity_of(&user)?,
            password_hash: user.password_hash,
            is_active: user.is_active,
        })
    }

    async fn find_identity_by_id(&self, id: i64) -> AppResult<Identity> {
        let user = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        identity_of(&user)
    }

    async fn login_taken(&self, username: &str, email: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users \
             WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($2))",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error("Failed to check existing users"))
    }

    async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, role_id) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error("Failed to create user"))
    }
}
