//! Session manager: issuance, refresh, logout, revocation, validation.
//!
//! This is the state-machine core of the crate. An (access, refresh) pair is
//! two independent credentials sharing one issuance event: the access token
//! lives and dies by its own expiry plus the blacklist, the refresh token by
//! its durable record in the revocation store.
//!
//! # Failure policy
//!
//! Refresh and revocation operations propagate errors. Blacklist operations
//! do not: writes are swallowed after a `warn!` so a storage hiccup never
//! blocks logout, and reads fail open so a transient read error never
//! rejects legitimate traffic. A false negative on the read side only means
//! a just-logged-out token stays usable for its remaining (short) lifetime.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use oxcart_core::User;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{BlacklistStore, RefreshTokenStore, UserStore};
use crate::token::{TokenCodec, TokenError, claims::TokenClaims};
use crate::types::{BlacklistEntry, RefreshTokenRecord, hash_token};

// =============================================================================
// Results
// =============================================================================

/// An access token and its companion refresh token.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Short-lived bearer credential for authenticating requests.
    pub access_token: String,
    /// Long-lived credential for minting new access tokens.
    pub refresh_token: String,
}

/// Per-category deletion counts from one garbage-collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Refresh records past their expiry.
    pub expired_refresh_tokens: u64,
    /// Refresh records revoked longer ago than the retention window.
    pub stale_revoked_tokens: u64,
    /// Blacklist entries whose token would have expired anyway.
    pub expired_blacklist_entries: u64,
}

impl CleanupReport {
    /// Total rows deleted across all categories.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.expired_refresh_tokens + self.stale_revoked_tokens + self.expired_blacklist_entries
    }
}

// =============================================================================
// Session Manager
// =============================================================================

/// Orchestrates the token codec and both revocation stores.
///
/// All session mutation in the system goes through this type; nothing else
/// writes to the refresh or blacklist stores.
pub struct SessionManager {
    codec: Arc<TokenCodec>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    blacklist: Arc<dyn BlacklistStore>,
    users: Arc<dyn UserStore>,
    revoked_retention: std::time::Duration,
}

impl SessionManager {
    /// Creates a session manager over the given codec and stores.
    #[must_use]
    pub fn new(
        codec: Arc<TokenCodec>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        blacklist: Arc<dyn BlacklistStore>,
        users: Arc<dyn UserStore>,
        revoked_retention: std::time::Duration,
    ) -> Self {
        Self {
            codec,
            refresh_tokens,
            blacklist,
            users,
            revoked_retention,
        }
    }

    /// The configured access token lifetime, in whole seconds.
    ///
    /// Reported to clients as `expiresIn`.
    #[must_use]
    pub fn access_ttl_seconds(&self) -> u64 {
        self.codec.access_ttl().as_secs()
    }

    /// The user store this manager resolves token subjects against.
    #[must_use]
    pub fn user_store(&self) -> Arc<dyn UserStore> {
        Arc::clone(&self.users)
    }

    /// Returns `true` if the token's `exp` claim is in the past.
    ///
    /// Fails closed: any decode failure other than expiry also reads as
    /// expired. Touches no storage.
    #[must_use]
    pub fn is_token_expired(&self, token: &str) -> bool {
        self.codec.is_expired(token)
    }

    /// Decodes and verifies a token, returning its claims.
    ///
    /// # Errors
    /// Returns a `TokenError` for a bad signature, malformed token, or
    /// expired claims.
    pub fn decode_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.codec.decode(token)
    }

    /// Issues a fresh (access, refresh) pair and persists the refresh record.
    ///
    /// # Errors
    /// Returns an error if token encoding or the durable write fails.
    pub async fn create_tokens(&self, user: &User) -> AuthResult<TokenPair> {
        let access_token = self.codec.issue_access_token(user)?;
        let refresh_token = self.codec.issue_refresh_token(user)?;

        // The record's expiry comes from the token's own claims, so the two
        // can never drift apart.
        let claims = self.codec.decode(&refresh_token)?;
        let expires_at = claims
            .expires_at()
            .map_err(|e| AuthError::internal(format!("refresh expiry out of range: {e}")))?;

        let record = RefreshTokenRecord::new(refresh_token.clone(), user.id, expires_at);
        self.refresh_tokens.save(&record).await?;

        debug!(user_id = %user.id, "issued token pair");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// The refresh token is never rotated: the same string stays valid until
    /// its own expiry or explicit revocation, and is returned unchanged.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for a blank token and `Authentication` for
    /// every validation failure: malformed or expired by claim, unknown to
    /// the store, revoked, expired by record, or owned by a user that no
    /// longer exists (fail closed).
    pub async fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::invalid_argument("refresh token is required"));
        }

        // Claim-level check first: signature, kind, expiry. No storage.
        if !self.codec.validate_refresh_token(refresh_token) {
            return Err(AuthError::authentication("refresh token failed validation"));
        }

        let record = self
            .refresh_tokens
            .find_by_token(refresh_token)
            .await?
            .ok_or_else(|| AuthError::authentication("unknown refresh token"))?;

        let now = OffsetDateTime::now_utc();
        if !record.is_valid_at(now) {
            return Err(AuthError::authentication("refresh token revoked or expired"));
        }

        // The owning user must still exist; orphaned records cannot mint.
        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or_else(|| AuthError::authentication("refresh token owner no longer exists"))?;

        let access_token = self.codec.issue_access_token(&user)?;
        debug!(user_id = %user.id, "refreshed access token");
        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }

    /// Revokes a single refresh token. Idempotent: unknown and
    /// already-revoked tokens are a no-op.
    ///
    /// # Errors
    /// Returns an error only if the storage operation fails.
    pub async fn revoke_refresh_token(&self, raw: &str) -> AuthResult<()> {
        let revoked = self
            .refresh_tokens
            .revoke(raw, OffsetDateTime::now_utc())
            .await?;
        if revoked {
            debug!("refresh token revoked");
        }
        Ok(())
    }

    /// Revokes every live refresh token owned by `user_id`.
    ///
    /// Used when credentials are compromised or on password change.
    ///
    /// # Errors
    /// Returns `NotFound` if the user does not exist, or a storage error.
    pub async fn revoke_all_user_tokens(&self, user_id: Uuid) -> AuthResult<u64> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::not_found("User"))?;

        let count = self
            .refresh_tokens
            .revoke_all_for_user(user.id, OffsetDateTime::now_utc())
            .await?;
        debug!(user_id = %user.id, count, "bulk-revoked refresh tokens");
        Ok(count)
    }

    /// Validates an access token against a specific user, blacklist first.
    pub async fn validate_access_token(&self, token: &str, user: &User) -> bool {
        if self.is_token_blacklisted(token).await {
            return false;
        }
        self.codec.validate_access_token(token, user)
    }

    /// Checks the blacklist for a token's hash.
    ///
    /// Fails open: a storage error reads as "not blacklisted", logged so
    /// operators can alert on it. The exposure is bounded by the access
    /// token's own short lifetime.
    pub async fn is_token_blacklisted(&self, token: &str) -> bool {
        match self.blacklist.exists(&hash_token(token)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "blacklist check failed; treating token as not blacklisted");
                false
            }
        }
    }

    /// Writes an access token's hash into the blacklist.
    ///
    /// Never fails from the caller's perspective: decode and storage errors
    /// are logged and swallowed so logout always completes. The entry
    /// expires exactly when the token itself would have, taken from its own
    /// claims with the signature still verified.
    pub async fn blacklist_token(&self, token: &str) {
        let claims = match self.codec.decode_allow_expired(token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "blacklist skipped: token did not decode");
                return;
            }
        };
        let expires_at = match claims.expires_at() {
            Ok(at) => at,
            Err(e) => {
                warn!(error = %e, "blacklist skipped: token expiry out of range");
                return;
            }
        };

        let entry = BlacklistEntry::new(hash_token(token), expires_at);
        if let Err(e) = self.blacklist.add(&entry).await {
            warn!(error = %e, "blacklist write failed; continuing logout");
        }
    }

    /// Ends a session: blacklists the access token, then revokes the refresh
    /// token when one was supplied.
    ///
    /// The two writes are independent and not atomic; partial success (no
    /// refresh token sent, so none revoked) is a normal outcome.
    ///
    /// # Errors
    /// Returns an error only if the refresh revocation write fails; the
    /// blacklist half never propagates.
    pub async fn logout(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> AuthResult<()> {
        if let Some(token) = access_token.filter(|t| !t.trim().is_empty()) {
            self.blacklist_token(token).await;
        }
        if let Some(token) = refresh_token.filter(|t| !t.trim().is_empty()) {
            self.revoke_refresh_token(token).await?;
        }
        Ok(())
    }

    /// One garbage-collection pass over both stores.
    ///
    /// Only deletes rows that are already terminal (expired, or revoked
    /// longer ago than the retention window), so it is idempotent and safe
    /// to run concurrently with live traffic.
    ///
    /// # Errors
    /// Returns an error if any of the delete operations fails.
    pub async fn cleanup_expired_tokens(&self) -> AuthResult<CleanupReport> {
        let now = OffsetDateTime::now_utc();
        let cutoff = now - self.revoked_retention;

        let expired_refresh_tokens = self.refresh_tokens.delete_expired(now).await?;
        let stale_revoked_tokens = self.refresh_tokens.delete_revoked_older_than(cutoff).await?;
        let expired_blacklist_entries = self.blacklist.delete_expired(now).await?;

        Ok(CleanupReport {
            expired_refresh_tokens,
            stale_revoked_tokens,
            expired_blacklist_entries,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use oxcart_core::Role;
    use std::time::Duration;
    use time::Duration as TimeDuration;

    use crate::storage::{MemoryBlacklistStore, MemoryRefreshTokenStore, MemoryUserStore};
    use crate::token::claims::TokenClaims;

    const SECRET: &str = "test-secret-material-at-least-32-bytes";

    struct Fixture {
        manager: SessionManager,
        codec: Arc<TokenCodec>,
        refresh_tokens: Arc<MemoryRefreshTokenStore>,
        blacklist: Arc<MemoryBlacklistStore>,
        users: Arc<MemoryUserStore>,
    }

    async fn fixture() -> Fixture {
        let codec = Arc::new(TokenCodec::new(
            SECRET,
            Duration::from_secs(900),
            Duration::from_secs(7 * 24 * 3600),
        ));
        let refresh_tokens = Arc::new(MemoryRefreshTokenStore::new());
        let blacklist = Arc::new(MemoryBlacklistStore::new());
        let users = Arc::new(MemoryUserStore::new());
        let manager = SessionManager::new(
            Arc::clone(&codec),
            Arc::clone(&refresh_tokens) as Arc<dyn RefreshTokenStore>,
            Arc::clone(&blacklist) as Arc<dyn BlacklistStore>,
            Arc::clone(&users) as Arc<dyn UserStore>,
            Duration::from_secs(30 * 24 * 3600),
        );
        Fixture {
            manager,
            codec,
            refresh_tokens,
            blacklist,
            users,
        }
    }

    async fn register(fx: &Fixture, email: &str) -> User {
        let user = User::new(email, "Test User", "$argon2id$stub", Role::Customer);
        fx.users.create(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn issued_access_token_validates_immediately() {
        let fx = fixture().await;
        let user = register(&fx, "alice@example.com").await;

        let pair = fx.manager.create_tokens(&user).await.unwrap();
        assert!(fx.manager.validate_access_token(&pair.access_token, &user).await);
    }

    #[tokio::test]
    async fn create_tokens_persists_refresh_record() {
        let fx = fixture().await;
        let user = register(&fx, "alice@example.com").await;

        let pair = fx.manager.create_tokens(&user).await.unwrap();
        let record = fx
            .refresh_tokens
            .find_by_token(&pair.refresh_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.user_id, user.id);
        assert!(record.is_valid());

        // Record expiry equals the token's own exp claim.
        let claims = fx.codec.decode(&pair.refresh_token).unwrap();
        assert_eq!(record.expires_at.unix_timestamp(), claims.exp);
    }

    #[tokio::test]
    async fn refresh_mints_new_access_token_without_rotation() {
        let fx = fixture().await;
        let user = register(&fx, "alice@example.com").await;
        let pair = fx.manager.create_tokens(&user).await.unwrap();

        let first = fx.manager.refresh_access_token(&pair.refresh_token).await.unwrap();
        assert_eq!(first.refresh_token, pair.refresh_token);
        assert_eq!(fx.codec.decode(&first.access_token).unwrap().sub, user.email);

        // Immediately refreshing again still succeeds with the same string.
        let second = fx.manager.refresh_access_token(&pair.refresh_token).await.unwrap();
        assert_eq!(second.refresh_token, pair.refresh_token);
    }

    #[tokio::test]
    async fn refresh_rejects_blank_and_garbage_tokens() {
        let fx = fixture().await;

        let err = fx.manager.refresh_access_token("  ").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidArgument { .. }));

        let err = fx.manager.refresh_access_token("not.a.token").await.unwrap_err();
        assert!(err.is_authentication_error());
    }

    #[tokio::test]
    async fn refresh_rejects_access_token_kind() {
        let fx = fixture().await;
        let user = register(&fx, "alice@example.com").await;
        let pair = fx.manager.create_tokens(&user).await.unwrap();

        let err = fx.manager.refresh_access_token(&pair.access_token).await.unwrap_err();
        assert!(err.is_authentication_error());
    }

    #[tokio::test]
    async fn refresh_fails_after_revocation_before_expiry() {
        let fx = fixture().await;
        let user = register(&fx, "alice@example.com").await;
        let pair = fx.manager.create_tokens(&user).await.unwrap();

        fx.manager.revoke_refresh_token(&pair.refresh_token).await.unwrap();

        let err = fx.manager.refresh_access_token(&pair.refresh_token).await.unwrap_err();
        assert!(err.is_authentication_error());

        // Revoking again is a no-op, not an error.
        fx.manager.revoke_refresh_token(&pair.refresh_token).await.unwrap();
        fx.manager.revoke_refresh_token("never-issued").await.unwrap();
    }

    #[tokio::test]
    async fn refresh_fails_closed_when_owner_deleted() {
        let fx = fixture().await;
        let user = register(&fx, "alice@example.com").await;
        let pair = fx.manager.create_tokens(&user).await.unwrap();

        fx.users.remove(user.id).await;

        let err = fx.manager.refresh_access_token(&pair.refresh_token).await.unwrap_err();
        assert!(err.is_authentication_error());
    }

    #[tokio::test]
    async fn bulk_revoke_touches_only_target_user() {
        let fx = fixture().await;
        let alice = register(&fx, "alice@example.com").await;
        let bob = register(&fx, "bob@example.com").await;

        let a1 = fx.manager.create_tokens(&alice).await.unwrap();
        let a2 = fx.manager.create_tokens(&alice).await.unwrap();
        let b1 = fx.manager.create_tokens(&bob).await.unwrap();

        let count = fx.manager.revoke_all_user_tokens(alice.id).await.unwrap();
        assert_eq!(count, 2);

        assert!(fx.manager.refresh_access_token(&a1.refresh_token).await.is_err());
        assert!(fx.manager.refresh_access_token(&a2.refresh_token).await.is_err());
        assert!(fx.manager.refresh_access_token(&b1.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn bulk_revoke_unknown_user_is_not_found() {
        let fx = fixture().await;
        let err = fx.manager.revoke_all_user_tokens(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound { .. }));
    }

    #[tokio::test]
    async fn blacklisted_token_fails_validation_before_expiry() {
        let fx = fixture().await;
        let user = register(&fx, "alice@example.com").await;
        let pair = fx.manager.create_tokens(&user).await.unwrap();

        assert!(!fx.manager.is_token_blacklisted(&pair.access_token).await);
        fx.manager.blacklist_token(&pair.access_token).await;

        assert!(fx.manager.is_token_blacklisted(&pair.access_token).await);
        assert!(!fx.manager.validate_access_token(&pair.access_token, &user).await);
    }

    #[tokio::test]
    async fn blacklist_entry_inherits_token_expiry() {
        let fx = fixture().await;
        let user = register(&fx, "alice@example.com").await;

        // An already-expired token can still be blacklisted; the entry gets
        // the token's real (past) expiry and is swept on the next GC pass.
        let now = OffsetDateTime::now_utc();
        let claims = TokenClaims::access(&user, now - TimeDuration::hours(2), now - TimeDuration::hours(1));
        let token = fx.codec.encode(&claims).unwrap();

        fx.manager.blacklist_token(&token).await;
        assert!(fx.manager.is_token_blacklisted(&token).await);
        assert_eq!(fx.blacklist.delete_expired(now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn logout_without_refresh_token_leaves_refresh_store_untouched() {
        let fx = fixture().await;
        let user = register(&fx, "alice@example.com").await;
        let pair = fx.manager.create_tokens(&user).await.unwrap();

        fx.manager.logout(Some(&pair.access_token), None).await.unwrap();

        assert!(fx.manager.is_token_blacklisted(&pair.access_token).await);
        let record = fx
            .refresh_tokens
            .find_by_token(&pair.refresh_token)
            .await
            .unwrap()
            .unwrap();
        assert!(!record.revoked);
    }

    #[tokio::test]
    async fn logout_with_both_tokens_ends_both_lifelines() {
        let fx = fixture().await;
        let user = register(&fx, "alice@example.com").await;
        let pair = fx.manager.create_tokens(&user).await.unwrap();

        fx.manager
            .logout(Some(&pair.access_token), Some(&pair.refresh_token))
            .await
            .unwrap();

        assert!(!fx.manager.validate_access_token(&pair.access_token, &user).await);
        assert!(fx.manager.refresh_access_token(&pair.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn logout_tolerates_blank_and_undecodable_tokens() {
        let fx = fixture().await;
        fx.manager.logout(None, None).await.unwrap();
        fx.manager.logout(Some(""), Some("   ")).await.unwrap();
        fx.manager.logout(Some("not.a.token"), None).await.unwrap();
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let fx = fixture().await;
        let user = register(&fx, "alice@example.com").await;
        let now = OffsetDateTime::now_utc();

        // An expired refresh record, a long-revoked one, and a live one.
        fx.refresh_tokens
            .save(&RefreshTokenRecord::new("tok-expired", user.id, now - TimeDuration::hours(1)))
            .await
            .unwrap();
        fx.refresh_tokens
            .save(&RefreshTokenRecord::new("tok-stale", user.id, now + TimeDuration::days(7)))
            .await
            .unwrap();
        fx.refresh_tokens
            .revoke("tok-stale", now - TimeDuration::days(40))
            .await
            .unwrap();
        let live = fx.manager.create_tokens(&user).await.unwrap();

        // An expired blacklist entry.
        fx.blacklist
            .add(&BlacklistEntry::new(hash_token("old-access"), now - TimeDuration::minutes(5)))
            .await
            .unwrap();

        let report = fx.manager.cleanup_expired_tokens().await.unwrap();
        assert_eq!(report.expired_refresh_tokens, 1);
        assert_eq!(report.stale_revoked_tokens, 1);
        assert_eq!(report.expired_blacklist_entries, 1);
        assert_eq!(report.total(), 3);

        // Second pass deletes nothing further.
        let report = fx.manager.cleanup_expired_tokens().await.unwrap();
        assert_eq!(report.total(), 0);

        assert!(fx.manager.refresh_access_token(&live.refresh_token).await.is_ok());
    }

    // -------------------------------------------------------------------------
    // Failure injection
    // -------------------------------------------------------------------------

    /// Blacklist store whose every operation fails.
    struct FailingBlacklistStore;

    #[async_trait]
    impl BlacklistStore for FailingBlacklistStore {
        async fn add(&self, _entry: &BlacklistEntry) -> AuthResult<()> {
            Err(AuthError::storage("injected write failure"))
        }

        async fn exists(&self, _token_hash: &str) -> AuthResult<bool> {
            Err(AuthError::storage("injected read failure"))
        }

        async fn delete_expired(&self, _now: OffsetDateTime) -> AuthResult<u64> {
            Err(AuthError::storage("injected cleanup failure"))
        }
    }

    async fn fixture_with_failing_blacklist() -> (SessionManager, Arc<MemoryUserStore>) {
        let codec = Arc::new(TokenCodec::new(
            SECRET,
            Duration::from_secs(900),
            Duration::from_secs(7 * 24 * 3600),
        ));
        let users = Arc::new(MemoryUserStore::new());
        let manager = SessionManager::new(
            codec,
            Arc::new(MemoryRefreshTokenStore::new()),
            Arc::new(FailingBlacklistStore),
            Arc::clone(&users) as Arc<dyn UserStore>,
            Duration::from_secs(30 * 24 * 3600),
        );
        (manager, users)
    }

    #[tokio::test]
    async fn blacklist_reads_fail_open() {
        let (manager, users) = fixture_with_failing_blacklist().await;
        let user = User::new("alice@example.com", "Alice", "$argon2id$stub", Role::Customer);
        users.create(&user).await.unwrap();

        let pair = manager.create_tokens(&user).await.unwrap();

        // Read errors report "not blacklisted" and the token stays usable.
        assert!(!manager.is_token_blacklisted(&pair.access_token).await);
        assert!(manager.validate_access_token(&pair.access_token, &user).await);
    }

    #[tokio::test]
    async fn blacklist_write_failure_never_blocks_logout() {
        let (manager, users) = fixture_with_failing_blacklist().await;
        let user = User::new("alice@example.com", "Alice", "$argon2id$stub", Role::Customer);
        users.create(&user).await.unwrap();

        let pair = manager.create_tokens(&user).await.unwrap();

        // Logout completes and the refresh-revocation half still lands.
        manager
            .logout(Some(&pair.access_token), Some(&pair.refresh_token))
            .await
            .unwrap();
        assert!(manager.refresh_access_token(&pair.refresh_token).await.is_err());
    }
}
