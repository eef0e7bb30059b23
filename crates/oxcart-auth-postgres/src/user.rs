//! User account storage for PostgreSQL.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use time::OffsetDateTime;
use uuid::Uuid;

use oxcart_auth::AuthResult;
use oxcart_auth::error::AuthError;
use oxcart_auth::storage::UserStore;
use oxcart_core::{Role, User};

use crate::{PgPool, StorageError};

type UserRow = (Uuid, String, String, String, String, OffsetDateTime);

fn row_to_user(row: UserRow) -> Result<User, AuthError> {
    let (id, email, name, password_hash, role, created_at) = row;
    let role = Role::from_str(&role)
        .map_err(|e| AuthError::storage(format!("stored role unreadable: {e}")))?;
    Ok(User {
        id,
        email,
        name,
        password_hash,
        role,
        created_at,
    })
}

/// PostgreSQL-backed user store over `users`.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Creates a store over a shared connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let result = query(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = StorageError::from(e);
                if err.is_unique_violation() {
                    Err(AuthError::invalid_argument("email already registered"))
                } else {
                    Err(err.into())
                }
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        let row: Option<UserRow> = query_as(
            r#"
            SELECT id, email, name, password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let row: Option<UserRow> = query_as(
            r#"
            SELECT id, email, name, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;
        row.map(row_to_user).transpose()
    }

    async fn count(&self) -> AuthResult<u64> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
