//! Authentication errors and their HTTP representation

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::jwt::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid request body")]
    InvalidRequest,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Missing token")]
    MissingToken,
    #[error("Token has been revoked")]
    TokenRevoked,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token has expired")]
    ExpiredToken,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidRequest => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::TokenRevoked
            | AuthError::InvalidToken
            | AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to send to clients. Internal detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidRequest => "Invalid request body",
            AuthError::InvalidCredentials => "Invalid username or password",
            AuthError::MissingToken => "Missing token",
            AuthError::TokenRevoked => "Token has been revoked",
            AuthError::InvalidToken => "Invalid token",
            AuthError::ExpiredToken => "Token has expired",
            AuthError::Internal(_) => "Internal server error",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::Signing(detail) => AuthError::Internal(detail),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Authentication internal error");
        }

        let status = self.status_code();
        let body = Json(json!({
            "status": "error",
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}
