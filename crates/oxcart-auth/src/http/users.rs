//! Authenticated user endpoints: profile lookup and admin token revocation.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use oxcart_core::{Authority, UserProfile};

use crate::AuthResult;
use crate::error::AuthError;
use crate::http::auth::AuthState;
use crate::middleware::{Identity, require_authority};

/// Response of the admin bulk-revocation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RevokeAllResponse {
    /// Number of refresh tokens revoked.
    pub revoked: u64,
}

/// `GET /api/users/me`: the authenticated caller's profile.
///
/// Loads the account fresh from the store rather than trusting the token's
/// embedded claims, so a renamed account reads back its current state.
///
/// # Errors
/// Returns 401 for anonymous callers and 404 if the account vanished
/// between the gate and this handler.
pub async fn me_handler(
    State(state): State<AuthState>,
    Identity(identity): Identity,
) -> AuthResult<Json<UserProfile>> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AuthError::not_found("User"))?;
    Ok(Json(user.profile()))
}

/// `POST /api/admin/users/{id}/revoke-tokens`: revokes every live refresh
/// token owned by the target user. Admin only.
///
/// # Errors
/// Returns 401 anonymous, 403 without `Authority::Admin`, 404 for an
/// unknown target user.
pub async fn revoke_user_tokens_handler(
    State(state): State<AuthState>,
    Identity(identity): Identity,
    Path(user_id): Path<Uuid>,
) -> AuthResult<Json<RevokeAllResponse>> {
    require_authority(&identity, Authority::Admin)?;

    let revoked = state.sessions.revoke_all_user_tokens(user_id).await?;
    info!(
        admin_id = %identity.user_id,
        target_id = %user_id,
        revoked,
        "admin revoked user refresh tokens"
    );
    Ok(Json(RevokeAllResponse { revoked }))
}
