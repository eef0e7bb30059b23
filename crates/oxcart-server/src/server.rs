//! Router assembly, state construction, and the server run loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use oxcart_auth::http as auth_http;
use oxcart_auth::middleware::authentication_gate;
use oxcart_auth::session::SessionManager;
use oxcart_auth::storage::{
    BlacklistStore, MemoryBlacklistStore, MemoryRefreshTokenStore, MemoryUserStore,
    RefreshTokenStore, UserStore,
};
use oxcart_auth::token::TokenCodec;
use oxcart_auth_postgres::{PgBlacklistStore, PgRefreshTokenStore, PgUserStore};

use crate::config::{AppConfig, DatabaseBackend};
use crate::handlers;
use crate::middleware as app_middleware;
use crate::seed::seed_admin;
use crate::state::AppState;
use crate::tasks::spawn_token_cleanup;

/// Builds application state for the configured database backend.
///
/// # Errors
/// Returns an error if the postgres pool cannot connect, schema creation
/// fails, or the seed-admin bootstrap fails.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let codec = Arc::new(TokenCodec::from_config(&cfg.auth));

    let (refresh_tokens, blacklist, users): (
        Arc<dyn RefreshTokenStore>,
        Arc<dyn BlacklistStore>,
        Arc<dyn UserStore>,
    ) = match cfg.database.backend {
        DatabaseBackend::Memory => {
            info!("using in-memory auth stores");
            (
                Arc::new(MemoryRefreshTokenStore::new()),
                Arc::new(MemoryBlacklistStore::new()),
                Arc::new(MemoryUserStore::new()),
            )
        }
        DatabaseBackend::Postgres => {
            let url = cfg
                .database
                .url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("database.url is required for postgres"))?;
            let pool = oxcart_auth_postgres::connect(url, cfg.database.max_connections).await?;
            oxcart_auth_postgres::ensure_schema(&pool).await?;
            info!("using PostgreSQL auth stores");
            (
                Arc::new(PgRefreshTokenStore::new(pool.clone())),
                Arc::new(PgBlacklistStore::new(pool.clone())),
                Arc::new(PgUserStore::new(pool)),
            )
        }
    };

    seed_admin(&users, &cfg.auth).await?;

    let sessions = Arc::new(SessionManager::new(
        codec,
        refresh_tokens,
        blacklist,
        users,
        cfg.auth.revoked_retention,
    ));

    Ok(AppState::new(sessions, cfg.auth.exempt_paths.clone()))
}

/// Assembles the full router over prepared state.
pub fn build_app(cfg: &AppConfig, state: AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    let gate = state.gate.clone();

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health))
        .route("/health/ready", get(handlers::ready))
        // Authentication surface
        .route("/api/auth/register", post(auth_http::register_handler))
        .route("/api/auth/login", post(auth_http::login_handler))
        .route("/api/auth/refresh", post(auth_http::refresh_handler))
        .route("/api/auth/logout", post(auth_http::logout_handler))
        // Authenticated endpoints
        .route("/api/users/me", get(auth_http::me_handler))
        .route(
            "/api/admin/users/{id}/revoke-tokens",
            post(auth_http::revoke_user_tokens_handler),
        )
        // Middleware stack (order: request id -> auth gate -> cors/compression/trace -> body limit)
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(middleware::from_fn_with_state(gate, authentication_gate))
        .layer(cors_layer(&cfg.server.cors_allowed_origins))
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %method,
                        http.target = %uri,
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Builds the CORS layer from configured origins. `*` keeps the permissive
/// development default; anything else becomes an explicit allow list,
/// skipping origins that fail header parsing.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<axum::http::HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new().allow_origin(tower_http::cors::AllowOrigin::list(allowed))
}

// =============================================================================
// Server
// =============================================================================

pub struct OxcartServer {
    addr: SocketAddr,
    app: Router,
    sessions: Arc<SessionManager>,
    cleanup_interval: std::time::Duration,
}

pub struct ServerBuilder {
    config: AppConfig,
}

impl ServerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    /// Connects storage, seeds the admin account, and assembles the router.
    ///
    /// # Errors
    /// Returns an error if state construction fails.
    pub async fn build(self) -> anyhow::Result<OxcartServer> {
        let state = build_state(&self.config).await?;
        let sessions = state.sessions();
        let app = build_app(&self.config, state);

        Ok(OxcartServer {
            addr: self.config.addr(),
            app,
            sessions,
            cleanup_interval: self.config.auth.cleanup_interval,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OxcartServer {
    /// Serves until ctrl-c or SIGTERM, then shuts down gracefully and stops
    /// the cleanup task.
    ///
    /// # Errors
    /// Returns an error if binding or serving fails.
    pub async fn run(self) -> anyhow::Result<()> {
        let cleanup = spawn_token_cleanup(self.sessions, self.cleanup_interval);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("listening on {}", self.addr);
        let result = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        cleanup.abort();
        result?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
