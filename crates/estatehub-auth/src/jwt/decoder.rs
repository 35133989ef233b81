//! JWT token validation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde_json::Value;

use estatehub_core::config::AuthConfig;
use estatehub_core::error::AppError;
use estatehub_core::result::AppResult;

use super::claims::Claims;

/// Verifies tokens signed by [`super::JwtEncoder`].
///
/// Stateless: no store lookups and no side effects.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
    leeway_seconds: i64,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in validate_token_at, after the signature.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            leeway_seconds: config.leeway_seconds as i64,
        }
    }

    /// Verifies signature, structure and expiry against the current clock.
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        self.validate_token_at(token, Utc::now().timestamp())
    }

    /// Verifies a token as of `now` (seconds since epoch).
    pub fn validate_token_at(&self, token: &str, now: i64) -> AppResult<Claims> {
        self.check_algorithm(token)?;

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::InvalidSignature | JwtErrorKind::InvalidAlgorithm => {
                    AppError::invalid_signature("Invalid token signature")
                }
                _ => AppError::malformed_token(format!("Malformed token: {e}")),
            })?
            .claims;

        if claims.exp <= claims.iat {
            return Err(AppError::malformed_token(
                "Token expires before it was issued",
            ));
        }

        if now >= claims.exp + self.leeway_seconds {
            return Err(AppError::expired("Token has expired"));
        }

        Ok(claims)
    }

    /// Reject any header whose `alg` is not the configured scheme, including
    /// names `jsonwebtoken` cannot represent such as `none`.
    fn check_algorithm(&self, token: &str) -> AppResult<()> {
        let segment = token.split('.').next().unwrap_or_default();
        let header: Value = URL_SAFE_NO_PAD
            .decode(segment)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| AppError::malformed_token("Malformed token header"))?;

        let alg = header
            .get("alg")
            .ok_or_else(|| AppError::malformed_token("Token header has no algorithm"))?;

        match serde_json::from_value::<Algorithm>(alg.clone()) {
            Ok(alg) if self.validation.algorithms.contains(&alg) => Ok(()),
            _ => Err(AppError::invalid_signature(format!(
                "Unexpected token algorithm {alg}"
            ))),
        }
    }

    /// Validates a token and requires access-token shape (role, no `jti`).
    pub fn validate_access_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.validate_token(token)?;
        if !claims.is_access() {
            return Err(AppError::malformed_token("Expected an access token"));
        }
        Ok(claims)
    }

    /// Validates a token and requires refresh-token shape (`jti`, no role).
    pub fn validate_refresh_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.validate_token(token)?;
        if !claims.is_refresh() {
            return Err(AppError::malformed_token("Expected a refresh token"));
        }
        Ok(claims)
    }
}
