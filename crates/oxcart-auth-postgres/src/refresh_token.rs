//! Refresh token record storage for PostgreSQL.
//!
//! System of record for refresh token validity. Rows key on the raw token
//! string (unique), and revocation is an in-place update so a completed
//! revoke is immediately visible to every subsequent validity read.

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use time::OffsetDateTime;
use uuid::Uuid;

use oxcart_auth::AuthResult;
use oxcart_auth::storage::RefreshTokenStore;
use oxcart_auth::types::RefreshTokenRecord;

use crate::{PgPool, StorageError};

type RefreshTokenRow = (
    Uuid,
    String,
    Uuid,
    OffsetDateTime,
    OffsetDateTime,
    bool,
    Option<OffsetDateTime>,
);

fn row_to_record(row: RefreshTokenRow) -> RefreshTokenRecord {
    let (id, token, user_id, expires_at, created_at, revoked, revoked_at) = row;
    RefreshTokenRecord {
        id,
        token,
        user_id,
        expires_at,
        created_at,
        revoked,
        revoked_at,
    }
}

/// PostgreSQL-backed refresh token store over `auth_refresh_tokens`.
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    /// Creates a store over a shared connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn save(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        query(
            r#"
            INSERT INTO auth_refresh_tokens
                (id, token, user_id, expires_at, created_at, revoked, revoked_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(&record.token)
        .bind(record.user_id)
        .bind(record.expires_at)
        .bind(record.created_at)
        .bind(record.revoked)
        .bind(record.revoked_at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(())
    }

    async fn find_by_token(&self, raw: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        let row: Option<RefreshTokenRow> = query_as(
            r#"
            SELECT id, token, user_id, expires_at, created_at, revoked, revoked_at
            FROM auth_refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(raw)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(row.map(row_to_record))
    }

    async fn find_valid(
        &self,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> AuthResult<Vec<RefreshTokenRecord>> {
        let rows: Vec<RefreshTokenRow> = query_as(
            r#"
            SELECT id, token, user_id, expires_at, created_at, revoked, revoked_at
            FROM auth_refresh_tokens
            WHERE user_id = $1 AND revoked = FALSE AND expires_at > $2
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(row_to_record).collect())
    }

    async fn exists_valid(&self, raw: &str, now: OffsetDateTime) -> AuthResult<bool> {
        let exists: bool = query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM auth_refresh_tokens
                WHERE token = $1 AND revoked = FALSE AND expires_at > $2
            )
            "#,
        )
        .bind(raw)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(exists)
    }

    async fn revoke(&self, raw: &str, at: OffsetDateTime) -> AuthResult<bool> {
        // The revoked = FALSE guard keeps the original revocation timestamp
        // and makes repeat revokes report false.
        let result = query(
            r#"
            UPDATE auth_refresh_tokens
            SET revoked = TRUE, revoked_at = $2
            WHERE token = $1 AND revoked = FALSE
            "#,
        )
        .bind(raw)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, at: OffsetDateTime) -> AuthResult<u64> {
        let result = query(
            r#"
            UPDATE auth_refresh_tokens
            SET revoked = TRUE, revoked_at = $2
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let result = query("DELETE FROM auth_refresh_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected())
    }

    async fn delete_revoked_older_than(&self, cutoff: OffsetDateTime) -> AuthResult<u64> {
        let result = query(
            r#"
            DELETE FROM auth_refresh_tokens
            WHERE revoked = TRUE AND revoked_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(result.rows_affected())
    }
}
