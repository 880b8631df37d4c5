// API crate clippy configuration
#![allow(clippy::inconsistent_digit_grouping)] // Epoch timestamps don't use grouping
// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Penbun API Library
//!
//! Authentication and session handling for the Penbun bookstore API:
//! credential login, token refresh, logout revocation and the gate that
//! protects every other route.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod security;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
