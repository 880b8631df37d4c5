//! Session management: login, refresh and logout
//!
//! Sessions are stateless. A session is a signed token; the only server-side
//! state is the revocation registry written on logout.

use std::sync::Arc;

use super::{
    blacklist::RevocationRegistry,
    clock::Clock,
    credentials::CredentialStore,
    error::AuthError,
    jwt::{Claims, JwtManager},
    password::{self, IMPOSSIBLE_HASH},
};

const BEARER_SCHEME: &str = "Bearer";

/// Strip an optional `Bearer ` prefix from a presented token.
///
/// A bare `Bearer` (trailing space already trimmed by the HTTP stack)
/// yields an empty token.
pub fn strip_bearer(raw: &str) -> &str {
    let raw = raw.trim();
    match raw.strip_prefix(BEARER_SCHEME) {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => raw,
    }
}

/// First characters of a token, enough to correlate log lines
pub(crate) fn token_prefix(token: &str) -> &str {
    token.get(..12).unwrap_or(token)
}

/// A freshly minted token together with its claims
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    Revoked,
    AlreadyRevoked,
}

/// Orchestrates credential checks, token issuance and revocation
#[derive(Clone)]
pub struct SessionManager {
    jwt: JwtManager,
    revocations: RevocationRegistry,
    credentials: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(
        jwt: JwtManager,
        revocations: RevocationRegistry,
        credentials: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jwt,
            revocations,
            credentials,
            clock,
        }
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    pub fn revocations(&self) -> &RevocationRegistry {
        &self.revocations
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Verify credentials and mint a new token.
    ///
    /// Unknown usernames and wrong passwords both surface as
    /// `InvalidCredentials`; which one it was only goes to the log.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidRequest);
        }

        let stored_hash = self
            .credentials
            .find_password_hash(username)
            .await
            .map_err(|e| AuthError::Internal(format!("credential lookup failed: {e}")))?;

        let Some(stored_hash) = stored_hash else {
            // Burn the same hashing cost as a real check
            let _ = check_password(password, IMPOSSIBLE_HASH).await;
            tracing::warn!(username = %username, "Login rejected: unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !check_password(password, &stored_hash).await? {
            tracing::warn!(username = %username, "Login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let (token, claims) = self.jwt.issue(username, self.clock.now())?;
        tracing::info!(username = %username, expires_at = claims.exp, "Login successful");

        Ok(IssuedToken { token, claims })
    }

    /// Validate a presented token: revocation first, then signature and expiry
    pub async fn authenticate(&self, presented: &str) -> Result<Claims, AuthError> {
        let token = strip_bearer(presented);
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        if self.revocations.contains(token).await {
            tracing::debug!(token_prefix = %token_prefix(token), "Rejected revoked token");
            return Err(AuthError::TokenRevoked);
        }

        Ok(self.jwt.decode_at(token, self.clock.now())?)
    }

    /// Mint a successor for a valid token.
    ///
    /// The presented token is not revoked; both stay usable until they
    /// expire or are logged out individually.
    pub async fn refresh(&self, presented: &str) -> Result<IssuedToken, AuthError> {
        let previous = self.authenticate(presented).await?;
        let (token, claims) = self.jwt.reissue(&previous, self.clock.now())?;

        tracing::info!(
            username = %claims.user_name,
            previous_iat = previous.iat,
            expires_at = claims.exp,
            "Token refreshed"
        );

        Ok(IssuedToken { token, claims })
    }

    /// Revoke a token. Idempotent; the token does not have to be valid.
    pub async fn logout(&self, presented: &str) -> Result<LogoutOutcome, AuthError> {
        let token = strip_bearer(presented);
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        // Entries only need to outlive the token. Unverifiable strings are
        // kept for one full token lifetime.
        let now = self.clock.now();
        let retain_until = match self.jwt.verify_signature(token) {
            Ok(claims) => claims.exp,
            Err(_) => self.jwt.expiry_from(now)?,
        };

        if self.revocations.add(token, retain_until).await {
            tracing::info!(token_prefix = %token_prefix(token), "Token revoked");
            Ok(LogoutOutcome::Revoked)
        } else {
            tracing::info!(
                token_prefix = %token_prefix(token),
                "Duplicate blacklist: token already revoked"
            );
            Ok(LogoutOutcome::AlreadyRevoked)
        }
    }
}

/// Argon2 is CPU-bound, so verification runs on the blocking pool
async fn check_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();

    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(format!("password verification task failed: {e}")))?
        .map_err(|e| AuthError::Internal(e.to_string()))
}
