//! Access token blacklist store trait.
//!
//! This module defines the storage interface for invalidated access token
//! hashes. When a user logs out, the access token's hash is stored here
//! until the token would have naturally expired, letting validation reject
//! tokens that are otherwise correctly signed and unexpired.
//!
//! # Security Considerations
//!
//! - Only SHA-256 hashes are stored; the raw token is a live bearer
//!   credential and never touches the database.
//! - Membership checks run on every authenticated request and must be fast.
//! - Entries become useless once the token's own expiry passes and are
//!   cleaned up periodically.

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::types::BlacklistEntry;

/// Storage trait for blacklisted access token hashes.
///
/// # Implementations
///
/// - `oxcart-auth-postgres` - PostgreSQL storage backend
/// - [`crate::storage::MemoryBlacklistStore`] - in-memory backend
///
/// # Failure Policy
///
/// Implementations report errors normally; the tolerant behavior around
/// blacklist failures (writes never block logout, reads never block
/// requests) is the session manager's responsibility, not the store's.
#[async_trait]
pub trait BlacklistStore: Send + Sync {
    /// Inserts an entry for a token hash.
    ///
    /// # Idempotency
    ///
    /// Inserting a hash that is already present succeeds without error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn add(&self, entry: &BlacklistEntry) -> AuthResult<()>;

    /// Checks whether a token hash is blacklisted.
    ///
    /// # Performance
    ///
    /// Called on every authenticated request; implementations should ensure
    /// the lookup is indexed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn exists(&self, token_hash: &str) -> AuthResult<bool>;

    /// Deletes entries whose expiry has passed as of `now`.
    ///
    /// # Returns
    ///
    /// The number of entries deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64>;
}
