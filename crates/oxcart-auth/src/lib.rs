//! # oxcart-auth
//!
//! Authentication and session lifecycle management for the oxcart backend.
//!
//! This crate provides:
//! - Signed bearer token issuance and validation (access + refresh)
//! - Refresh token revocation with per-user bulk revoke
//! - Access token blacklisting for immediate logout
//! - The per-request authentication gate and identity extractors
//! - Axum HTTP handlers for the `/api/auth` surface
//!
//! ## Overview
//!
//! Sessions are a pair of independent credentials sharing an issuance event:
//! a short-lived access token that authenticates individual requests, and a
//! long-lived refresh token whose only job is minting new access tokens.
//! Revocation is asymmetric: refresh tokens are revoked in their durable
//! store, access tokens are blacklisted by hash until their own expiry.
//!
//! ## Modules
//!
//! - [`config`] - Token lifetimes, signing secret, exempt paths
//! - [`token`] - Claims, codec, and token-level validation
//! - [`types`] - Refresh token records and blacklist entries
//! - [`storage`] - Storage traits plus in-memory implementations
//! - [`session`] - The session manager orchestrating issuance and revocation
//! - [`middleware`] - The request authentication gate and extractors
//! - [`password`] - Password hash/verify facade
//! - [`http`] - Axum handlers for register/login/refresh/logout

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod password;
pub mod session;
pub mod storage;
pub mod token;
pub mod types;

pub use config::AuthConfig;
pub use error::{AuthError, ErrorCategory};
pub use http::{
    AuthState, LoginRequest, LogoutRequest, MessageResponse, RefreshRequest, RegisterRequest,
    RevokeAllResponse, TokenResponse, login_handler, logout_handler, me_handler,
    refresh_handler, register_handler, revoke_user_tokens_handler,
};
pub use middleware::{
    AuthenticatedIdentity, GateState, Identity, OptionalIdentity, authentication_gate,
    require_authority,
};
pub use session::{CleanupReport, SessionManager, TokenPair};
pub use storage::{
    BlacklistStore, MemoryBlacklistStore, MemoryRefreshTokenStore, MemoryUserStore,
    RefreshTokenStore, UserStore,
};
pub use token::{TokenClaims, TokenCodec, TokenError, TokenKind};
pub use types::{BlacklistEntry, RefreshTokenRecord, hash_token};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;
