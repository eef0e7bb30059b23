//! Request-scoped authenticated identity.

use std::collections::BTreeSet;

use serde::Serialize;
use uuid::Uuid;

use oxcart_core::{Authority, Role, User, authorities_for};

/// The caller's identity for one request.
///
/// Built by the authentication gate after full token validation and carried
/// in the request's extensions: never in any process-wide ambient state, so
/// identity cannot leak across requests. The authority set is expanded once
/// at construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedIdentity {
    /// Stable account identifier.
    pub user_id: Uuid,

    /// Account email, the token's subject.
    pub email: String,

    /// Account role as stored.
    pub role: Role,

    /// Hierarchy-expanded authorities for this role.
    pub authorities: BTreeSet<Authority>,
}

impl AuthenticatedIdentity {
    /// Builds an identity from a resolved user account.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            authorities: authorities_for(user.role),
        }
    }

    /// Returns `true` if this identity holds the given authority.
    #[must_use]
    pub fn has_authority(&self, authority: Authority) -> bool {
        self.authorities.contains(&authority)
    }

    /// Returns `true` if this identity may perform back-office operations.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_authority(Authority::Admin)
    }
}
