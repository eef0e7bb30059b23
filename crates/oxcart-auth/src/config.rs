//! Authentication configuration.
//!
//! Embedded into the server's root configuration under the `auth` section.
//! Durations deserialize from humantime strings (`"15m"`, `"7d"`).
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! signing_secret = "0123456789abcdef0123456789abcdef"
//! access_token_ttl = "15m"
//! refresh_token_ttl = "7d"
//! cleanup_interval = "1h"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum length of the shared signing secret in bytes.
///
/// HS256 secrets shorter than the hash output weaken the MAC, so anything
/// below 32 bytes is rejected at validation time.
pub const MIN_SECRET_BYTES: usize = 32;

/// Authentication and session lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared symmetric signing secret for both token kinds.
    ///
    /// Possession of this secret compromises access and refresh lifelines
    /// equally. Set it via `OXCART__AUTH__SIGNING_SECRET` in production.
    pub signing_secret: String,

    /// Access token lifetime.
    /// Intentionally short so blacklist lag has a bounded window.
    #[serde(with = "humantime_serde")]
    pub access_token_ttl: Duration,

    /// Refresh token lifetime.
    /// Long-lived; the revocation store, not expiry, is the primary defense.
    #[serde(with = "humantime_serde")]
    pub refresh_token_ttl: Duration,

    /// How often the garbage-collection task runs.
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,

    /// How long revoked refresh records are retained before deletion.
    #[serde(with = "humantime_serde")]
    pub revoked_retention: Duration,

    /// Path prefixes the authentication gate skips entirely.
    pub exempt_paths: Vec<String>,

    /// Email for the first-run administrator account (seeded only when the
    /// user table is empty; disabled when unset).
    pub seed_admin_email: Option<String>,

    /// Password for the first-run administrator account.
    pub seed_admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            access_token_ttl: Duration::from_secs(15 * 60), // 15 minutes
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600), // 7 days
            cleanup_interval: Duration::from_secs(3600),    // 1 hour
            revoked_retention: Duration::from_secs(30 * 24 * 3600), // 30 days
            exempt_paths: default_exempt_paths(),
            seed_admin_email: None,
            seed_admin_password: None,
        }
    }
}

fn default_exempt_paths() -> Vec<String> {
    [
        "/api/auth",
        "/api/public",
        "/health",
        "/docs",
        "/favicon.ico",
        "/error",
        "/",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl AuthConfig {
    /// Sets the signing secret.
    #[must_use]
    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = secret.into();
        self
    }

    /// Sets the access token lifetime.
    #[must_use]
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Sets the refresh token lifetime.
    #[must_use]
    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    /// Sets the garbage-collection interval.
    #[must_use]
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Sets the revoked-record retention window.
    #[must_use]
    pub fn with_revoked_retention(mut self, retention: Duration) -> Self {
        self.revoked_retention = retention;
        self
    }

    /// Returns `true` if `path` matches an exempt prefix.
    #[must_use]
    pub fn is_exempt(&self, path: &str) -> bool {
        path_is_exempt(&self.exempt_paths, path)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.signing_secret.len() < MIN_SECRET_BYTES {
            return Err(format!(
                "auth.signing_secret must be at least {MIN_SECRET_BYTES} bytes"
            ));
        }
        if self.access_token_ttl.is_zero() {
            return Err("auth.access_token_ttl must be > 0".into());
        }
        if self.refresh_token_ttl.is_zero() {
            return Err("auth.refresh_token_ttl must be > 0".into());
        }
        if self.cleanup_interval.is_zero() {
            return Err("auth.cleanup_interval must be > 0".into());
        }
        if self.seed_admin_email.is_some() != self.seed_admin_password.is_some() {
            return Err("auth.seed_admin_email and auth.seed_admin_password must be set together".into());
        }
        Ok(())
    }
}

/// Prefix matching for exempt paths.
///
/// A prefix matches itself and any deeper path under it. The root path `/`
/// matches only exactly, so exempting it does not exempt the whole server.
#[must_use]
pub fn path_is_exempt(prefixes: &[String], path: &str) -> bool {
    prefixes.iter().any(|prefix| {
        if prefix == "/" {
            path == "/"
        } else {
            path == prefix
                || (path.len() > prefix.len()
                    && path.starts_with(prefix.as_str())
                    && path.as_bytes()[prefix.len()] == b'/')
        }
    })
}
