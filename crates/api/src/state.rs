//! Application state

use std::sync::Arc;

use crate::{
    auth::{AuthState, Clock, CredentialStore, JwtManager, RevocationRegistry, SessionManager},
    config::Config,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(
        config: Config,
        credentials: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let jwt_manager = JwtManager::new(
            &config.jwt_secret,
            config.jwt_issuer.clone(),
            config.jwt_expiry_secs,
        );
        tracing::info!(
            issuer = %config.jwt_issuer,
            expiry_secs = config.jwt_expiry_secs,
            "JWT manager initialized"
        );

        // Revocations live in this process only and are lost on restart
        let revocations = RevocationRegistry::new();
        tracing::info!("Revocation registry initialized (in-memory)");

        let sessions = SessionManager::new(jwt_manager, revocations, credentials, clock);

        Self { config, sessions }
    }

    /// Get auth state for middleware
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            sessions: self.sessions.clone(),
        }
    }
}
