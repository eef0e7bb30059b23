//! Refresh token record domain type.
//!
//! This module defines the refresh token record persisted by the revocation
//! store.
//!
//! # Security
//!
//! - The record keys on the raw token string, which the store enforces as
//!   unique. Uniqueness of the string itself comes from the fresh `jti`
//!   claim embedded at issuance.
//! - Records are revoked individually or in bulk per user, and physically
//!   deleted by periodic garbage collection once terminal.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Refresh token record stored in the database.
///
/// A record is created when a session is issued, mutated only through the
/// defined revoke operations, and deleted by garbage collection once expired
/// or revoked past the retention window.
///
/// # Validity
///
/// A record is valid iff `revoked == false` and `expires_at` is in the
/// future. Both checks are against the database state, not the token's own
/// claims: the store is the system of record for revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRecord {
    /// Unique identifier for this record.
    pub id: Uuid,

    /// The raw refresh token string, unique across records.
    pub token: String,

    /// User this token was issued to.
    pub user_id: Uuid,

    /// When this token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When this record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Whether this token has been revoked.
    pub revoked: bool,

    /// When this token was revoked (None = not revoked).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub revoked_at: Option<OffsetDateTime>,
}

impl RefreshTokenRecord {
    /// Creates a new active record for a freshly issued token.
    #[must_use]
    pub fn new(token: impl Into<String>, user_id: Uuid, expires_at: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            token: token.into(),
            user_id,
            expires_at,
            created_at: OffsetDateTime::now_utc(),
            revoked: false,
            revoked_at: None,
        }
    }

    /// Returns `true` if this token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    /// Returns `true` if this token is expired as of `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }

    /// Returns `true` if this token has been revoked.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Returns `true` if this token is valid (not expired and not revoked).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(OffsetDateTime::now_utc())
    }

    /// Returns `true` if this token is valid as of `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        !self.revoked && !self.is_expired_at(now)
    }

    /// Marks this record revoked as of `at`. Idempotent: an already revoked
    /// record keeps its original revocation timestamp.
    pub fn revoke(&mut self, at: OffsetDateTime) {
        if !self.revoked {
            self.revoked = true;
            self.revoked_at = Some(at);
        }
    }
}
