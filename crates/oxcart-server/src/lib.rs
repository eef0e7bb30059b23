//! # oxcart-server
//!
//! HTTP server for the oxcart backend: configuration loading, observability,
//! router assembly over the auth crates, background token garbage
//! collection, and graceful shutdown.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod seed;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::AppConfig;
pub use observability::{apply_logging_level, init_tracing};
pub use server::{OxcartServer, ServerBuilder, build_app, build_state};
pub use state::AppState;
