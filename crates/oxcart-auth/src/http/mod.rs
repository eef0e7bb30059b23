//! Axum handlers for the authentication surface.

pub mod auth;
pub mod users;

pub use auth::{
    AuthState, LoginRequest, LogoutRequest, MessageResponse, RefreshRequest, RegisterRequest,
    TokenResponse, login_handler, logout_handler, refresh_handler, register_handler,
};
pub use users::{RevokeAllResponse, me_handler, revoke_user_tokens_handler};
