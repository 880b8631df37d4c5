//! Session routes: login, logout, refresh and the caller's identity

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{authorization_header, AuthError, AuthUser, LogoutOutcome},
    error::ApiResult,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub token: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub status: &'static str,
    pub user_name: String,
    pub issuer: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected malformed login body");
        AuthError::InvalidRequest
    })?;

    let issued = state
        .sessions
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        status: "success",
        token: issued.token,
        message: "Login successful",
    }))
}

/// POST /logout
///
/// The token is revoked as presented; it is not required to be valid.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<LogoutResponse>> {
    let presented = authorization_header(&headers)?.unwrap_or_default();

    match state.sessions.logout(presented).await? {
        LogoutOutcome::Revoked | LogoutOutcome::AlreadyRevoked => Ok(Json(LogoutResponse {
            status: "success",
            message: "Logged out successfully",
        })),
    }
}

/// POST /refresh
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<RefreshResponse>> {
    let presented = authorization_header(&headers)?.unwrap_or_default();
    let issued = state.sessions.refresh(presented).await?;

    Ok(Json(RefreshResponse {
        token: issued.token,
    }))
}

/// GET /me (behind `require_auth`)
pub async fn me(Extension(auth_user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        status: "success",
        user_name: auth_user.user_name,
        issuer: auth_user.claims.iss,
        issued_at: auth_user.claims.iat,
        expires_at: auth_user.claims.exp,
    })
}
