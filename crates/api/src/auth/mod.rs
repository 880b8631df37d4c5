//! Authentication module for Penbun

pub mod blacklist;
pub mod clock;
pub mod credentials;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod sessions;
#[cfg(test)]
pub(crate) mod test_support;

pub use blacklist::{spawn_sweeper, RevocationRegistry};
pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{
    CredentialStore, CredentialStoreError, InMemoryCredentialStore, PgCredentialStore,
};
pub use error::AuthError;
pub use jwt::{
    Claims, JwtManager, TokenError, DEFAULT_ISSUER, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS,
};
pub use middleware::{authorization_header, require_auth, AuthState, AuthUser};
pub use password::{hash_password, verify_password, PasswordError};
pub use sessions::{strip_bearer, IssuedToken, LogoutOutcome, SessionManager};
