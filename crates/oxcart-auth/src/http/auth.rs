//! Handlers for `/api/auth`: register, login, refresh, logout.
//!
//! Login and refresh failures all collapse to the same generic 401 body;
//! the handlers never reveal whether an email exists or which check failed.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use oxcart_core::{Role, User, UserProfile};

use crate::AuthResult;
use crate::error::AuthError;
use crate::middleware::auth::extract_bearer;
use crate::password::{hash_password, verify_password};
use crate::session::{SessionManager, TokenPair};
use crate::storage::UserStore;

/// Minimum accepted password length.
const MIN_PASSWORD_CHARS: usize = 8;

// =============================================================================
// State
// =============================================================================

/// Shared state for the authentication handlers.
#[derive(Clone)]
pub struct AuthState {
    /// Session manager handling all token issuance and revocation.
    pub sessions: Arc<SessionManager>,
    /// User accounts.
    pub users: Arc<dyn UserStore>,
}

impl AuthState {
    /// Creates handler state from a session manager, sharing its user store.
    #[must_use]
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        let users = sessions.user_store();
        Self { sessions, users }
    }
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Account email; must be unique.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Plaintext password, hashed before storage.
    pub password: String,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Optional body of `POST /api/auth/logout`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    /// Refresh token to revoke alongside blacklisting the access token.
    pub refresh_token: Option<String>,
}

/// Token pair returned by register, login, and refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `"Bearer"`.
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// Present on register and login; omitted on refresh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl TokenResponse {
    fn new(pair: TokenPair, expires_in: u64, user: Option<UserProfile>) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer",
            expires_in,
            user,
        }
    }
}

/// Generic message body.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/auth/register`: creates an account and starts a session.
///
/// # Errors
/// Returns 400 for invalid fields or a duplicate email, 500 on storage
/// failure.
pub async fn register_handler(
    State(state): State<AuthState>,
    Json(request): Json<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<TokenResponse>)> {
    let email = request.email.trim();
    let name = request.name.trim();
    validate_registration(email, name, &request.password)?;

    let password_hash = hash_password(&request.password)?;
    // Self-registration always yields a customer account.
    let user = User::new(email, name, password_hash, Role::Customer);
    state.users.create(&user).await?;

    let pair = state.sessions.create_tokens(&user).await?;
    info!(user_id = %user.id, "registered new account");

    let response = TokenResponse::new(
        pair,
        state.sessions.access_ttl_seconds(),
        Some(user.profile()),
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /api/auth/login`: verifies credentials and issues a token pair.
///
/// # Errors
/// Returns the generic 401 for an unknown email and for a wrong password
/// alike.
pub async fn login_handler(
    State(state): State<AuthState>,
    Json(request): Json<LoginRequest>,
) -> AuthResult<Json<TokenResponse>> {
    let user = state
        .users
        .find_by_email(request.email.trim())
        .await?
        .ok_or_else(|| AuthError::authentication("unknown email"))?;

    if !verify_password(&request.password, &user.password_hash) {
        debug!(user_id = %user.id, "password verification failed");
        return Err(AuthError::authentication("wrong password"));
    }

    let pair = state.sessions.create_tokens(&user).await?;
    info!(user_id = %user.id, "login succeeded");

    Ok(Json(TokenResponse::new(
        pair,
        state.sessions.access_ttl_seconds(),
        Some(user.profile()),
    )))
}

/// `POST /api/auth/refresh`: exchanges a refresh token for a new access
/// token. The refresh token itself is returned unchanged.
///
/// # Errors
/// Returns 400 for a blank token and 401 for every validation failure.
pub async fn refresh_handler(
    State(state): State<AuthState>,
    Json(request): Json<RefreshRequest>,
) -> AuthResult<Json<TokenResponse>> {
    let pair = state
        .sessions
        .refresh_access_token(&request.refresh_token)
        .await?;
    Ok(Json(TokenResponse::new(
        pair,
        state.sessions.access_ttl_seconds(),
        None,
    )))
}

/// `POST /api/auth/logout`: ends the session.
///
/// Tolerant by design: works with any combination of bearer header and
/// refresh token in the body, and always answers 200 so clients can clear
/// local state unconditionally.
pub async fn logout_handler(
    State(state): State<AuthState>,
    headers: HeaderMap,
    body: Option<Json<LogoutRequest>>,
) -> Json<MessageResponse> {
    let access_token = extract_bearer(&headers);
    let refresh_token = body.as_ref().and_then(|b| b.refresh_token.as_deref());

    if let Err(e) = state.sessions.logout(access_token, refresh_token).await {
        warn!(error = %e, "logout cleanup failed; responding success anyway");
    }

    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

fn validate_registration(email: &str, name: &str, password: &str) -> AuthResult<()> {
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::invalid_argument("a valid email is required"));
    }
    if name.is_empty() {
        return Err(AuthError::invalid_argument("name is required"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AuthError::invalid_argument(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}
