//! PostgreSQL storage backend for oxcart-auth
//!
//! Provides persistent implementations of the auth storage traits:
//!
//! - [`PgUserStore`] - user accounts (`users`)
//! - [`PgRefreshTokenStore`] - refresh token records (`auth_refresh_tokens`)
//! - [`PgBlacklistStore`] - access token hashes (`auth_token_blacklist`)
//!
//! All three share one connection pool. [`ensure_schema`] creates the
//! tables and indexes at bootstrap; statements are idempotent so repeated
//! startups are safe.
//!
//! # Example
//!
//! ```ignore
//! use oxcart_auth_postgres::{connect, ensure_schema, PgRefreshTokenStore};
//!
//! let pool = connect("postgres://localhost/oxcart", 10).await?;
//! ensure_schema(&pool).await?;
//! let refresh_tokens = PgRefreshTokenStore::new(pool.clone());
//! ```

pub mod blacklist;
pub mod refresh_token;
pub mod user;

use sqlx_core::pool::{Pool, PoolOptions};
use sqlx_postgres::Postgres;
use tracing::{debug, info, instrument};

pub use blacklist::PgBlacklistStore;
pub use refresh_token::PgRefreshTokenStore;
pub use user::PgUserStore;

use oxcart_auth::error::AuthError;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during auth storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// Resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data could not be mapped back to a domain type.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Create a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Returns `true` if the underlying database error is a unique-key
    /// violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(e) => e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation()),
            _ => false,
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(e: StorageError) -> Self {
        AuthError::storage(e.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Pool + Schema
// =============================================================================

/// Connects a pool to the given database URL.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str, max_connections: u32) -> StorageResult<PgPool> {
    let pool = PoolOptions::<Postgres>::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    debug!(max_connections, "connected PostgreSQL pool");
    Ok(pool)
}

/// Creates the auth tables and their indexes if they do not exist.
///
/// # Errors
///
/// Returns an error if any DDL statement fails.
#[instrument(skip(pool))]
pub async fn ensure_schema(pool: &PgPool) -> StorageResult<()> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS auth_refresh_tokens (
            id UUID PRIMARY KEY,
            token TEXT UNIQUE NOT NULL,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at TIMESTAMPTZ NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            revoked BOOLEAN NOT NULL DEFAULT FALSE,
            revoked_at TIMESTAMPTZ
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS auth_token_blacklist (
            id UUID PRIMARY KEY,
            token_hash TEXT UNIQUE NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL,
            blacklisted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_token ON auth_refresh_tokens(token)",
        "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user_id ON auth_refresh_tokens(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_expires_at ON auth_refresh_tokens(expires_at)",
        "CREATE INDEX IF NOT EXISTS idx_token_blacklist_hash ON auth_token_blacklist(token_hash)",
        "CREATE INDEX IF NOT EXISTS idx_token_blacklist_expires_at ON auth_token_blacklist(expires_at)",
    ];

    for statement in statements {
        sqlx_core::query::query(statement).execute(pool).await?;
    }

    info!("auth schema ensured");
    Ok(())
}
