//! Shared application state.

use std::sync::Arc;

use axum::extract::FromRef;

use oxcart_auth::http::AuthState;
use oxcart_auth::middleware::GateState;
use oxcart_auth::session::SessionManager;
use oxcart_auth::storage::UserStore;

/// State shared by every route.
///
/// Substates are extracted via `FromRef`, so handlers declare only the slice
/// they need.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth: AuthState,
    pub gate: GateState,
}

impl AppState {
    /// Builds both substates around one session manager.
    #[must_use]
    pub fn new(sessions: Arc<SessionManager>, exempt_paths: Vec<String>) -> Self {
        Self {
            auth: AuthState::new(Arc::clone(&sessions)),
            gate: GateState::new(sessions, exempt_paths),
        }
    }

    /// The session manager behind both substates.
    #[must_use]
    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.auth.sessions)
    }

    /// The user store, for readiness checks and bootstrap.
    #[must_use]
    pub fn users(&self) -> Arc<dyn UserStore> {
        Arc::clone(&self.auth.users)
    }
}
