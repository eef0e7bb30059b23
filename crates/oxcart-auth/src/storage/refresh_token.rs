//! Refresh token revocation store trait.
//!
//! This module defines the storage interface for refresh token records: the
//! durable system of record for which refresh tokens are still usable.
//!
//! # Security Considerations
//!
//! - The store, not the token's own expiry claim, is the primary defense
//!   for the long refresh lifeline: revocation must be authoritative.
//! - Validity reads must be transactionally consistent with the store's own
//!   writes; once a revocation write completes, no subsequent read may
//!   observe the record as valid.
//! - Garbage collection only deletes rows that are already terminal, so it
//!   is safe to run concurrently with live traffic.

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::RefreshTokenRecord;

/// Storage trait for refresh token records.
///
/// Records key on the raw token string, which implementations must enforce
/// as unique.
///
/// # Implementations
///
/// - `oxcart-auth-postgres` - PostgreSQL storage backend
/// - [`crate::storage::MemoryRefreshTokenStore`] - in-memory backend
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persists a freshly issued record.
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error if the write fails, including when the
    /// token string collides with an existing record.
    async fn save(&self, record: &RefreshTokenRecord) -> AuthResult<()>;

    /// Looks up a record by its raw token string.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_token(&self, raw: &str) -> AuthResult<Option<RefreshTokenRecord>>;

    /// Returns every record owned by `user_id` that is valid as of `now`
    /// (not revoked, not expired).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_valid(
        &self,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> AuthResult<Vec<RefreshTokenRecord>>;

    /// Single boolean validity check for a raw token string, without
    /// materializing the full record.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn exists_valid(&self, raw: &str, now: OffsetDateTime) -> AuthResult<bool>;

    /// Marks the record for `raw` revoked as of `at`.
    ///
    /// # Returns
    ///
    /// `true` if a non-revoked record was revoked, `false` if no record
    /// matched or it was already revoked.
    ///
    /// # Idempotency
    ///
    /// Revoking an unknown or already-revoked token succeeds without error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke(&self, raw: &str, at: OffsetDateTime) -> AuthResult<bool>;

    /// Bulk-revokes every currently non-revoked record owned by `user_id`,
    /// stamping each with `at`.
    ///
    /// Used when a user's credentials are compromised or on password change.
    ///
    /// # Returns
    ///
    /// The number of records newly revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke_all_for_user(&self, user_id: Uuid, at: OffsetDateTime) -> AuthResult<u64>;

    /// Deletes records whose expiry has passed as of `now`.
    ///
    /// Garbage collection primitive: idempotent, and safe to run
    /// concurrently with issuance and revocation because expired records
    /// are unusable by definition.
    ///
    /// # Returns
    ///
    /// The number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64>;

    /// Deletes records revoked before `cutoff`.
    ///
    /// Revoked records are retained for a window (for audit trails and
    /// incident forensics) and then physically removed.
    ///
    /// # Returns
    ///
    /// The number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn delete_revoked_older_than(&self, cutoff: OffsetDateTime) -> AuthResult<u64>;
}
