//! Fixtures shared by the auth tests

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    blacklist::RevocationRegistry,
    clock::ManualClock,
    credentials::{CredentialStore, CredentialStoreError, InMemoryCredentialStore},
    jwt::{JwtManager, DEFAULT_ISSUER, DEFAULT_TOKEN_TTL_SECS},
    password::hash_password_for_tests,
    sessions::SessionManager,
};

pub(crate) const TEST_SECRET: &str = "test-jwt-secret-key-for-testing-only";

/// Starting instant of every harness clock
pub(crate) const T0: i64 = 1_700_000_000;

pub(crate) struct Harness {
    pub sessions: SessionManager,
    pub clock: ManualClock,
}

/// Session manager over an in-memory store holding `alice`/`wonderland`
/// and `bob`/`builder`, with a clock frozen at `T0`
pub(crate) fn harness() -> Harness {
    harness_with_store(Arc::new(fixture_store()))
}

fn fixture_store() -> InMemoryCredentialStore {
    [
        ("alice".to_string(), hash_password_for_tests("wonderland")),
        ("bob".to_string(), hash_password_for_tests("builder")),
    ]
    .into_iter()
    .collect()
}

pub(crate) fn harness_with_store(store: Arc<dyn CredentialStore>) -> Harness {
    let clock = ManualClock::new(T0);
    let sessions = SessionManager::new(
        JwtManager::new(TEST_SECRET, DEFAULT_ISSUER, DEFAULT_TOKEN_TTL_SECS),
        RevocationRegistry::new(),
        store,
        Arc::new(clock.clone()),
    );

    Harness { sessions, clock }
}

/// Store that fails every lookup
pub(crate) struct UnavailableStore;

#[async_trait]
impl CredentialStore for UnavailableStore {
    async fn find_password_hash(
        &self,
        _username: &str,
    ) -> Result<Option<String>, CredentialStoreError> {
        Err(CredentialStoreError::Unavailable(
            "connection refused".to_string(),
        ))
    }
}

/// Full application state over the same fixtures as `harness`
pub(crate) fn app_state() -> (crate::state::AppState, ManualClock) {
    let config = crate::config::Config::from_lookup(|name| match name {
        "JWT_SECRET" => Some(TEST_SECRET.to_string()),
        "DATABASE_URL" => Some("postgres://localhost/penbun_test".to_string()),
        _ => None,
    })
    .unwrap();

    let clock = ManualClock::new(T0);
    let state = crate::state::AppState::new(
        config,
        Arc::new(fixture_store()),
        Arc::new(clock.clone()),
    );
    (state, clock)
}
