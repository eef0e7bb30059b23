//! Access token blacklist entry domain type.
//!
//! # Security
//!
//! The raw access token is a live bearer credential and is never persisted.
//! Entries key on a SHA-256 hash of the token string, and expire exactly
//! when the token itself would have: keeping an entry past that point is
//! pointless because the token already fails expiry checks.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Hash a token value using SHA-256, hex-encoded lowercase.
///
/// Used both when inserting blacklist entries and when checking membership.
#[must_use]
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// A blacklisted access token, stored by hash.
///
/// Presence of an entry means the corresponding token is invalid regardless
/// of its own signature and expiry validity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntry {
    /// Unique identifier for this entry.
    pub id: Uuid,

    /// SHA-256 hash of the raw access token, unique across entries.
    pub token_hash: String,

    /// When the underlying token expires. The entry is garbage collected
    /// after this instant.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When the token was blacklisted.
    #[serde(with = "time::serde::rfc3339")]
    pub blacklisted_at: OffsetDateTime,
}

impl BlacklistEntry {
    /// Creates a new entry for a token hash, expiring when the token does.
    #[must_use]
    pub fn new(token_hash: impl Into<String>, expires_at: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            token_hash: token_hash.into(),
            expires_at,
            blacklisted_at: OffsetDateTime::now_utc(),
        }
    }

    /// Returns `true` if the underlying token's expiry has passed.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_hash_token() {
        let token = "test-token-value";
        let hash = hash_token(token);

        // SHA-256 produces 64 hex characters
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));

        // Same input produces same hash
        assert_eq!(hash, hash_token(token));

        // Different input produces different hash
        assert_ne!(hash, hash_token("different-token"));
    }

    #[test]
    fn test_entry_expiry() {
        let now = OffsetDateTime::now_utc();
        let entry = BlacklistEntry::new(hash_token("some-token"), now + Duration::minutes(15));

        assert!(!entry.is_expired_at(now));
        assert!(entry.is_expired_at(now + Duration::minutes(16)));
    }

    #[test]
    fn test_serialization() {
        let now = OffsetDateTime::now_utc();
        let entry = BlacklistEntry::new(hash_token("some-token"), now + Duration::minutes(15));

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("tokenHash").is_some());
        assert!(json.get("blacklistedAt").is_some());

        let deserialized: BlacklistEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.token_hash, deserialized.token_hash);
    }
}
