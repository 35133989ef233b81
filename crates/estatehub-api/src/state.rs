//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use estatehub_auth::access::{AccessGuard, AccessPolicy};
use estatehub_auth::jwt::JwtDecoder;
use estatehub_auth::service::AuthService;
use estatehub_core::config::AppConfig;
use estatehub_database::store::{IdentityStore, ResourceStore};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks and read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Register, login and refresh flows
    pub auth_service: Arc<AuthService>,
    /// Access token validator
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Role-gate and owner-gate
    pub access_guard: Arc<AccessGuard>,
    /// Owned collections
    pub resources: Arc<dyn ResourceStore>,
}

impl AppState {
    /// Wire the auth core over the given stores.
    pub fn new(
        config: AppConfig,
        identities: Arc<dyn IdentityStore>,
        resources: Arc<dyn ResourceStore>,
    ) -> Self {
        let auth_service = AuthService::new(&config.auth, identities);
        let jwt_decoder = auth_service.decoder().clone();
        let access_guard = AccessGuard::new(AccessPolicy::new(), resources.clone());

        Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
            jwt_decoder: Arc::new(jwt_decoder),
            access_guard: Arc::new(access_guard),
            resources,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("auth_service", &self.auth_service)
            .field("access_guard", &self.access_guard)
            .finish_non_exhaustive()
    }
}
