//! Registration, login and token refresh.

use std::sync::Arc;

use tracing::{info, warn};

use estatehub_core::config::AuthConfig;
use estatehub_core::error::{AppError, ErrorKind};
use estatehub_core::result::AppResult;
use estatehub_database::store::IdentityStore;
use estatehub_entity::user::{CreateUser, Identity, User, UserRole};

use crate::jwt::{JwtDecoder, JwtEncoder, TokenPair};
use crate::password::{PasswordHasher, PasswordValidator};

/// Credential flows over an [`IdentityStore`].
#[derive(Clone)]
pub struct AuthService {
    identities: Arc<dyn IdentityStore>,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    encoder: JwtEncoder,
    decoder: JwtDecoder,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("encoder", &self.encoder)
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    /// Creates a new auth service.
    pub fn new(config: &AuthConfig, identities: Arc<dyn IdentityStore>) -> Self {
        Self {
            identities,
            hasher: PasswordHasher::new(),
            validator: PasswordValidator::new(config),
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
        }
    }

    /// Returns the token decoder shared with the request middleware.
    pub fn decoder(&self) -> &JwtDecoder {
        &self.decoder
    }

    /// Create an account with the default role.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> AppResult<User> {
        self.validator.validate(password)?;

        if self.identities.login_taken(username, email).await? {
            return Err(AppError::conflict("Username or email already registered"));
        }

        let role_id = self
            .identities
            .find_role_by_name(UserRole::DEFAULT.as_str())
            .await?;
        let password_hash = self.hasher.hash_password(password)?;

        let user = self
            .identities
            .create_user(CreateUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role_id,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Exchange a username or email and password for a token pair.
    ///
    /// An unknown identifier and a wrong password fail identically.
    pub async fn login(&self, identifier: &str, password: &str) -> AppResult<TokenPair> {
        let credential = match self
            .identities
            .find_identity_by_login_identifier(identifier)
            .await
        {
            Ok(credential) => credential,
            Err(e) if e.kind == ErrorKind::NotFound => {
                self.hasher.verify_dummy(password);
                warn!("Login failed: unknown identifier");
                return Err(AppError::credential_mismatch());
            }
            Err(e) => return Err(e),
        };

        if !self
            .hasher
            .verify_password(password, &credential.password_hash)
        {
            warn!(user_id = credential.identity.id, "Login failed: wrong password");
            return Err(AppError::credential_mismatch());
        }

        if !credential.is_active {
            warn!(user_id = credential.identity.id, "Login refused: account disabled");
            return Err(AppError::forbidden("Account is disabled"));
        }

        let Identity { id, role } = credential.identity;
        let pair = self.encoder.generate_tokens(id, role)?;
        info!(user_id = id, role = %role, "User logged in");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair, re-reading the current role.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.decoder.validate_refresh_token(refresh_token)?;

        let identity = match self.identities.find_identity_by_id(claims.user_id).await {
            Ok(identity) => identity,
            Err(e) if e.kind == ErrorKind::NotFound => {
                return Err(AppError::malformed_token("Token subject no longer exists"));
            }
            Err(e) => return Err(e),
        };

        self.encoder.generate_tokens(identity.id, identity.role)
    }

    /// The current identity of an authenticated caller.
    pub async fn current_identity(&self, user_id: i64) -> AppResult<Identity> {
        self.identities.find_identity_by_id(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use estatehub_database::{MemoryStore, ResourceStore};
    use estatehub_entity::resource::ResourceKind;

    use super::*;

    fn service() -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = AuthService::new(&AuthConfig::with_secret("service-secret"), store.clone());
        (service, store)
    }

    #[tokio::test]
    async fn test_register_and_login_scenario() {
        let (service, _) = service();
        let user = service
            .register("alice", "alice@x.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(user.role(), Some(UserRole::User));
        assert_ne!(user.password_hash, "hunter2");

        let err = service.login("alice", "wrong").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::CredentialMismatch);

        let pair = service.login("alice@x.com", "hunter2").await.unwrap();
        let claims = service
            .decoder()
            .validate_access_token(&pair.access_token)
            .unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.role, Some(UserRole::User));
    }

    #[tokio::test]
    async fn test_unknown_identifier_matches_wrong_password() {
        let (service, _) = service();
        let err = service.login("nobody", "hunter2").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::CredentialMismatch);
        assert_eq!(err.message, "Invalid credentials");

        let err = service
            .login("nobody", "estatehub-no-such-account")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::CredentialMismatch);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_short_passwords() {
        let (service, _) = service();
        service.register("alice", "alice@x.com", "hunter2").await.unwrap();

        let err = service
            .register("alice2", "alice@x.com", "hunter2")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let err = service.register("bob", "bob@x.com", "12345").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_disabled_account_cannot_log_in() {
        let (service, store) = service();
        let user = service.register("carol", "carol@x.com", "hunter2").await.unwrap();
        store.set_active(user.id, false);

        let err = service.login("carol", "hunter2").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_refresh_picks_up_role_change() {
        let (service, store) = service();
        let hash = PasswordHasher::new().hash_password("hunter2").unwrap();
        let dave = store.seed_user("dave", "dave@x.com", &hash, UserRole::User);

        let pair = service.login("dave", "hunter2").await.unwrap();
        let err = service.refresh(&pair.access_token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedToken);

        let promote = ResourceKind::User
            .parse_payload(serde_json::json!({"role": "agent"}))
            .unwrap();
        store.update(dave.id, &promote).await.unwrap();

        let refreshed = service.refresh(&pair.refresh_token).await.unwrap();
        let claims = service
            .decoder()
            .validate_access_token(&refreshed.access_token)
            .unwrap();
        assert_eq!(claims.user_id, dave.id);
        assert_eq!(claims.role, Some(UserRole::Agent));
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_account() {
        let (service, store) = service();
        let hash = PasswordHasher::new().hash_password("hunter2").unwrap();
        let frank = store.seed_user("frank", "frank@x.com", &hash, UserRole::User);
        let pair = service.login("frank", "hunter2").await.unwrap();

        store.delete(ResourceKind::User, frank.id).await.unwrap();
        let err = service.refresh(&pair.refresh_token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedToken);
    }
}
