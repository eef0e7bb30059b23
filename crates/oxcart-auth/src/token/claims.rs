//! Claims embedded in signed bearer tokens.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use oxcart_core::{Role, User};

// ============================================================================
// Token Kind
// ============================================================================

/// Discriminates the two token lifelines.
///
/// Both kinds are signed with the same secret; the `kind` claim is the only
/// thing preventing a refresh token from authenticating a request or an
/// access token from minting new tokens, so every consumer must check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived credential authenticating individual requests.
    Access,
    /// Long-lived credential used solely to mint new access tokens.
    Refresh,
}

impl TokenKind {
    /// Returns the claim value as embedded in tokens.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Token Claims
// ============================================================================

/// Claims carried by both access and refresh tokens.
///
/// Timestamps are absolute Unix seconds. Access tokens carry `role` and
/// `name` for downstream authorization and display; refresh tokens omit them
/// and instead carry a fresh `jti` so two refresh tokens minted for the same
/// user in the same second stay independently revocable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Subject: the user's email.
    pub sub: String,

    /// Owning user id.
    pub uid: Uuid,

    /// Token kind discriminator.
    pub kind: TokenKind,

    /// Account role (access tokens only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Display name (access tokens only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Unique token id (refresh tokens only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl TokenClaims {
    /// Creates access token claims for a user.
    #[must_use]
    pub fn access(user: &User, issued_at: OffsetDateTime, expires_at: OffsetDateTime) -> Self {
        Self {
            sub: user.email.clone(),
            uid: user.id,
            kind: TokenKind::Access,
            role: Some(user.role),
            name: Some(user.name.clone()),
            jti: None,
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        }
    }

    /// Creates refresh token claims for a user, with a fresh unique id.
    #[must_use]
    pub fn refresh(user: &User, issued_at: OffsetDateTime, expires_at: OffsetDateTime) -> Self {
        Self {
            sub: user.email.clone(),
            uid: user.id,
            kind: TokenKind::Refresh,
            role: None,
            name: None,
            jti: Some(Uuid::new_v4().to_string()),
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        }
    }

    /// Returns `true` for access token claims.
    #[must_use]
    pub fn is_access(&self) -> bool {
        self.kind == TokenKind::Access
    }

    /// Returns `true` for refresh token claims.
    #[must_use]
    pub fn is_refresh(&self) -> bool {
        self.kind == TokenKind::Refresh
    }

    /// Returns the expiry as an `OffsetDateTime`.
    ///
    /// # Errors
    /// Fails if the embedded timestamp is outside the representable range.
    pub fn expires_at(&self) -> Result<OffsetDateTime, time::error::ComponentRange> {
        OffsetDateTime::from_unix_timestamp(self.exp)
    }
}
