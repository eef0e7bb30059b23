//! The request authentication gate and identity extractors.
//!
//! The gate runs on every request as axum middleware. Per request it walks
//! a fixed sequence: exempt-path check (no decode attempted), bearer
//! extraction, cheap expiry check, blacklist check, subject resolution, and
//! a final binding re-validation against the resolved user. Only full
//! success attaches an [`AuthenticatedIdentity`] to the request; every
//! failure path yields an anonymous request instead of an error, and
//! downstream authorization rejects anonymous callers where identity is
//! required.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use oxcart_core::Authority;

use crate::AuthResult;
use crate::config::path_is_exempt;
use crate::error::AuthError;
use crate::middleware::identity::AuthenticatedIdentity;
use crate::session::SessionManager;

// =============================================================================
// Gate State
// =============================================================================

/// State the authentication gate needs: the session manager and the list of
/// path prefixes it skips.
#[derive(Clone)]
pub struct GateState {
    sessions: Arc<SessionManager>,
    exempt_paths: Arc<Vec<String>>,
}

impl GateState {
    /// Creates gate state from a session manager and exempt prefixes.
    #[must_use]
    pub fn new(sessions: Arc<SessionManager>, exempt_paths: Vec<String>) -> Self {
        Self {
            sessions,
            exempt_paths: Arc::new(exempt_paths),
        }
    }

    /// Returns `true` if the gate skips this path entirely.
    #[must_use]
    pub fn is_exempt(&self, path: &str) -> bool {
        path_is_exempt(&self.exempt_paths, path)
    }
}

// =============================================================================
// Gate Middleware
// =============================================================================

/// Authentication gate middleware, applied via
/// `axum::middleware::from_fn_with_state`.
///
/// Never returns an error response itself: requests proceed anonymous when
/// validation fails, and handlers that need identity reject via the
/// [`Identity`] extractor.
pub async fn authentication_gate(
    State(state): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    if state.is_exempt(request.uri().path()) {
        return next.run(request).await;
    }

    if let Some(identity) = authenticate(&state, request.headers()).await {
        request.extensions_mut().insert(identity);
    }
    next.run(request).await
}

/// Runs the full validation sequence for one request.
///
/// Returns `None` for every failure: missing or malformed header, expired
/// or blacklisted token, unresolvable subject, or a token that does not
/// bind to the resolved user.
async fn authenticate(state: &GateState, headers: &HeaderMap) -> Option<AuthenticatedIdentity> {
    let token = extract_bearer(headers)?;

    // Cheap claim-level expiry check first; no storage touched.
    if state.sessions.is_token_expired(token) {
        debug!("bearer token expired; proceeding anonymous");
        return None;
    }

    if state.sessions.is_token_blacklisted(token).await {
        debug!("bearer token blacklisted; proceeding anonymous");
        return None;
    }

    // Resolve the subject to a live account.
    let claims = state.sessions.decode_token(token).ok()?;
    let user = match state.sessions.user_store().find_by_email(&claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!("token subject has no account; proceeding anonymous");
            return None;
        }
        Err(e) => {
            debug!(error = %e, "user lookup failed; proceeding anonymous");
            return None;
        }
    };

    // Binding check: re-validate the token specifically against the
    // resolved user, covering kind and subject equality.
    if !state.sessions.validate_access_token(token, &user).await {
        debug!("token failed binding validation; proceeding anonymous");
        return None;
    }

    Some(AuthenticatedIdentity::from_user(&user))
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// Absence or a malformed prefix reads as no token, not as an error.
pub(crate) fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Extractors
// =============================================================================

/// Extractor requiring an authenticated identity.
///
/// Rejects with a generic 401 when the gate attached no identity.
pub struct Identity(pub AuthenticatedIdentity);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .map(Identity)
            .ok_or_else(|| AuthError::authentication("authentication required"))
    }
}

/// Extractor that yields `None` for anonymous requests instead of rejecting.
pub struct OptionalIdentity(pub Option<AuthenticatedIdentity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalIdentity(
            parts.extensions.get::<AuthenticatedIdentity>().cloned(),
        ))
    }
}

/// Rejects with `Forbidden` when the identity lacks `authority`.
///
/// # Errors
/// Returns `AuthError::Forbidden` (403) on a missing authority.
pub fn require_authority(identity: &AuthenticatedIdentity, authority: Authority) -> AuthResult<()> {
    if identity.has_authority(authority) {
        return Ok(());
    }
    Err(AuthError::forbidden(format!(
        "requires {authority} authority"
    )))
}

// =============================================================================
// Tests
// =============================================================================
