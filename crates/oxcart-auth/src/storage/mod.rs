//! Storage traits for session and account data.
//!
//! This module defines storage interfaces for:
//!
//! - Refresh token records (the refresh revocation store)
//! - Blacklisted access token hashes
//! - User accounts
//!
//! # Implementations
//!
//! PostgreSQL implementations are provided by the `oxcart-auth-postgres`
//! crate. In-memory implementations live in [`memory`] and back the memory
//! database backend as well as most unit tests.

pub mod blacklist;
pub mod memory;
pub mod refresh_token;
pub mod user;

pub use blacklist::BlacklistStore;
pub use memory::{MemoryBlacklistStore, MemoryRefreshTokenStore, MemoryUserStore};
pub use refresh_token::RefreshTokenStore;
pub use user::UserStore;
