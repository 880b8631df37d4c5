//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{error::AuthError, jwt::Claims, sessions::SessionManager};

/// Authenticated identity, inserted into request extensions by `require_auth`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_name: String,
    pub claims: Claims,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_name: claims.user_name.clone(),
            claims,
        }
    }
}

/// State needed for authentication
#[derive(Clone)]
pub struct AuthState {
    pub sessions: SessionManager,
}

/// Raw `Authorization` header value.
///
/// `Ok(None)` when the header is absent, `Err` when it is not valid ASCII.
pub fn authorization_header(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    match headers.get(AUTHORIZATION) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| AuthError::InvalidToken),
    }
}

/// Middleware that requires a valid, unrevoked bearer token
pub async fn require_auth(
    State(auth_state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let presented = authorization_header(request.headers()).map(|h| h.map(String::from));

    let auth_result = match presented {
        Ok(Some(header)) => auth_state.sessions.authenticate(&header).await,
        Ok(None) => Err(AuthError::MissingToken),
        Err(err) => Err(err),
    };

    match auth_result {
        Ok(claims) => {
            tracing::debug!(
                path = %path,
                username = %claims.user_name,
                "require_auth: authentication successful"
            );
            request.extensions_mut().insert(AuthUser::from(claims));
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "require_auth: authentication failed");
            err.into_response()
        }
    }
}
