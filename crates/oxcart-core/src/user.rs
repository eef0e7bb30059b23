//! User account types.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::role::Role;

/// A user account as held by the user store.
///
/// Carries the password hash, so it never crosses the HTTP boundary;
/// responses use [`UserProfile`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Stable account identifier.
    pub id: Uuid,

    /// Login identifier, unique across accounts.
    pub email: String,

    /// Display name.
    pub name: String,

    /// Opaque password hash in PHC string format.
    pub password_hash: String,

    /// Account role. Authority expansion happens at authentication time.
    pub role: Role,

    /// Account creation instant.
    pub created_at: OffsetDateTime,
}

impl User {
    /// Creates a new account with a fresh id and the current timestamp.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            password_hash: password_hash.into(),
            role,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Returns the externally visible projection of this account.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Externally visible user projection returned by the HTTP surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
