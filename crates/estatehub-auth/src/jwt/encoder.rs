//! Token issuance.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use estatehub_core::config::AuthConfig;
use estatehub_core::error::AppError;
use estatehub_core::result::AppResult;
use estatehub_entity::user::UserRole;

use super::claims::Claims;

/// Signs access and refresh tokens with the shared HS256 secret.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Result of a successful token pair generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_token_ttl_minutes as i64),
            refresh_ttl: Duration::hours(config.refresh_token_ttl_hours as i64),
        }
    }

    /// Issues an access + refresh token pair for the given account.
    pub fn generate_tokens(&self, user_id: i64, role: UserRole) -> AppResult<TokenPair> {
        self.generate_tokens_at(user_id, role, Utc::now())
    }

    /// Issues a token pair as of `now`. Both tokens share the same `iat`.
    pub fn generate_tokens_at(
        &self,
        user_id: i64,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> AppResult<TokenPair> {
        let access_exp = now + self.access_ttl;
        let refresh_exp = now + self.refresh_ttl;

        let access_claims = Claims {
            user_id,
            role: Some(role),
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
            jti: None,
        };

        let refresh_claims = Claims {
            user_id,
            role: None,
            iat: now.timestamp(),
            exp: refresh_exp.timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
        };

        Ok(TokenPair {
            access_token: self.sign(&access_claims)?,
            refresh_token: self.sign(&refresh_claims)?,
            access_expires_at: access_exp,
            refresh_expires_at: refresh_exp,
        })
    }

    /// Signs arbitrary claims with HS256.
    pub fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::signing(format!("Failed to encode token: {e}")))
    }
}
