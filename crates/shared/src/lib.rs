#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Penbun Shared
//!
//! Database plumbing shared by the Penbun binaries: pool construction and
//! the credential table the authentication core reads from.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// How long a request waits for a pooled connection before failing
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle connections are recycled after this long
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Pool options used for regular request-path queries
pub fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
}

/// Create the shared connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options(max_connections).connect(database_url).await?;
    tracing::debug!(max_connections, "Database pool created");
    Ok(pool)
}

/// Create the `users` credential table if it does not exist yet.
///
/// The table is owned by the user-management flows; this only exists so a
/// fresh development database can be seeded.
pub async fn ensure_users_table(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            username TEXT PRIMARY KEY,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a user or replace the stored hash of an existing one
pub async fn upsert_user(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        ON CONFLICT (username)
        DO UPDATE SET password_hash = EXCLUDED.password_hash,
                      updated_at = NOW()
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .execute(pool)
    .await?;

    Ok(())
}
