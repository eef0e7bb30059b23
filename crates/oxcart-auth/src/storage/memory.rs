//! In-memory storage backends.
//!
//! These implementations back the `memory` database backend for local runs
//! and are the default fixtures for unit and integration tests. State lives
//! in process memory and is lost on restart, so they are not for production
//! use.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use oxcart_core::User;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{BlacklistStore, RefreshTokenStore, UserStore};
use crate::types::{BlacklistEntry, RefreshTokenRecord};

// =============================================================================
// Refresh Token Store
// =============================================================================

/// In-memory refresh token store, keyed by the raw token string.
#[derive(Debug, Default)]
pub struct MemoryRefreshTokenStore {
    records: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl MemoryRefreshTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn save(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.token) {
            return Err(AuthError::storage("duplicate refresh token"));
        }
        records.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find_by_token(&self, raw: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        Ok(self.records.read().await.get(raw).cloned())
    }

    async fn find_valid(
        &self,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> AuthResult<Vec<RefreshTokenRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id && r.is_valid_at(now))
            .cloned()
            .collect())
    }

    async fn exists_valid(&self, raw: &str, now: OffsetDateTime) -> AuthResult<bool> {
        Ok(self
            .records
            .read()
            .await
            .get(raw)
            .is_some_and(|r| r.is_valid_at(now)))
    }

    async fn revoke(&self, raw: &str, at: OffsetDateTime) -> AuthResult<bool> {
        let mut records = self.records.write().await;
        match records.get_mut(raw) {
            Some(record) if !record.revoked => {
                record.revoke(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, at: OffsetDateTime) -> AuthResult<u64> {
        let mut records = self.records.write().await;
        let mut count = 0u64;
        for record in records.values_mut() {
            if record.user_id == user_id && !record.revoked {
                record.revoke(at);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !r.is_expired_at(now));
        Ok((before - records.len()) as u64)
    }

    async fn delete_revoked_older_than(&self, cutoff: OffsetDateTime) -> AuthResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !(r.revoked && r.revoked_at.is_some_and(|at| at < cutoff)));
        Ok((before - records.len()) as u64)
    }
}

// =============================================================================
// Blacklist Store
// =============================================================================

/// In-memory access token blacklist, keyed by token hash.
#[derive(Debug, Default)]
pub struct MemoryBlacklistStore {
    entries: RwLock<HashMap<String, BlacklistEntry>>,
}

impl MemoryBlacklistStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlacklistStore for MemoryBlacklistStore {
    async fn add(&self, entry: &BlacklistEntry) -> AuthResult<()> {
        let mut entries = self.entries.write().await;
        entries
            .entry(entry.token_hash.clone())
            .or_insert_with(|| entry.clone());
        Ok(())
    }

    async fn exists(&self, token_hash: &str) -> AuthResult<bool> {
        Ok(self.entries.read().await.contains_key(token_hash))
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired_at(now));
        Ok((before - entries.len()) as u64)
    }
}

// =============================================================================
// User Store
// =============================================================================

/// In-memory user account store.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes an account. Not part of [`UserStore`]: account deletion is
    /// outside the auth flows, but tests need it to simulate users deleted
    /// while their tokens are still live.
    pub async fn remove(&self, id: Uuid) -> Option<User> {
        self.users.write().await.remove(&id)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::invalid_argument("email already registered"));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn count(&self) -> AuthResult<u64> {
        Ok(self.users.read().await.len() as u64)
    }
}

// =============================================================================
// Tests
// =============================================================================
