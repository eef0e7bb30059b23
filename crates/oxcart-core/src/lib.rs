//! Core domain types for the oxcart backend.
//!
//! This crate holds the types shared by every other oxcart crate: the user
//! record, the closed role enum, and the authority expansion used by
//! authorization checks. It deliberately has no I/O and no framework
//! dependencies.

pub mod role;
pub mod user;

pub use role::{Authority, Role, RoleParseError, authorities_for};
pub use user::{User, UserProfile};
