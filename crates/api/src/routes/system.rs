//! Unauthenticated service routes

use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiError;

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Fallback for unknown paths
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
