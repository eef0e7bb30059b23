//! Roles and authorities.
//!
//! Roles form a strict hierarchy: `Superadmin` implies `Admin` implies
//! `Customer`. The hierarchy is expanded by [`authorities_for`], a pure
//! function over the closed [`Role`] enum. Callers compute the authority set
//! once per authenticated identity and treat it as immutable afterwards.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Role
// =============================================================================

/// Account role stored on the user record.
///
/// Serialized uppercase (`"CUSTOMER"`, `"ADMIN"`, `"SUPERADMIN"`) both in
/// JSON and in the database `role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular shopper account. The default for self-registration.
    Customer,
    /// Back-office operator.
    Admin,
    /// Full administrative control, including admin management.
    Superadmin,
}

impl Role {
    /// Returns the stored string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Admin => "ADMIN",
            Self::Superadmin => "SUPERADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Self::Customer),
            "ADMIN" => Ok(Self::Admin),
            "SUPERADMIN" => Ok(Self::Superadmin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

// =============================================================================
// Authority
// =============================================================================

/// A single granted authority.
///
/// Authorities mirror the role names; the difference is that a role is what
/// an account *is*, while the authority set is what an account *may do*
/// after hierarchy expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Authority {
    Customer,
    Admin,
    Superadmin,
}

impl Authority {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Admin => "ADMIN",
            Self::Superadmin => "SUPERADMIN",
        }
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Expands a role into its full authority set.
///
/// Pure function: `Superadmin` grants all three authorities, `Admin` grants
/// admin and customer, `Customer` grants only itself. There is no other
/// source of authorities in the system.
#[must_use]
pub fn authorities_for(role: Role) -> BTreeSet<Authority> {
    let authorities: &[Authority] = match role {
        Role::Customer => &[Authority::Customer],
        Role::Admin => &[Authority::Admin, Authority::Customer],
        Role::Superadmin => &[
            Authority::Superadmin,
            Authority::Admin,
            Authority::Customer,
        ],
    };
    authorities.iter().copied().collect()
}
