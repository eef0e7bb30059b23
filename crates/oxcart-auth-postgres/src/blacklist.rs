//! Access token blacklist storage for PostgreSQL.
//!
//! Stores SHA-256 hashes of invalidated access tokens; the raw token never
//! touches the database. Membership is checked on every authenticated
//! request, so lookups run against the unique index on `token_hash`.

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_scalar::query_scalar;
use time::OffsetDateTime;

use oxcart_auth::AuthResult;
use oxcart_auth::storage::BlacklistStore;
use oxcart_auth::types::BlacklistEntry;

use crate::{PgPool, StorageError};

/// PostgreSQL-backed blacklist store over `auth_token_blacklist`.
pub struct PgBlacklistStore {
    pool: PgPool,
}

impl PgBlacklistStore {
    /// Creates a store over a shared connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlacklistStore for PgBlacklistStore {
    async fn add(&self, entry: &BlacklistEntry) -> AuthResult<()> {
        // Re-blacklisting the same token (double logout) is a no-op.
        query(
            r#"
            INSERT INTO auth_token_blacklist (id, token_hash, expires_at, blacklisted_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (token_hash) DO NOTHING
            "#,
        )
        .bind(entry.id)
        .bind(&entry.token_hash)
        .bind(entry.expires_at)
        .bind(entry.blacklisted_at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(())
    }

    async fn exists(&self, token_hash: &str) -> AuthResult<bool> {
        let exists: bool = query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM auth_token_blacklist WHERE token_hash = $1
            )
            "#,
        )
        .bind(token_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(exists)
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let result = query("DELETE FROM auth_token_blacklist WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected())
    }
}
