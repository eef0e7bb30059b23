//! Persisted session domain types.

pub mod blacklist;
pub mod refresh_token;

pub use blacklist::{BlacklistEntry, hash_token};
pub use refresh_token::RefreshTokenRecord;
