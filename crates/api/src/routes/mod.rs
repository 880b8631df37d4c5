//! HTTP routes

pub mod auth;
pub mod system;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{auth::require_auth, state::AppState};

/// Build the application router. Outer layers (CORS, tracing, security
/// headers) are added by the binary.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(
            state.auth_state(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(system::health))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/refresh", post(auth::refresh))
        .merge(protected)
        .fallback(system::not_found)
        .with_state(state)
}
