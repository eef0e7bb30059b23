//! Request authentication middleware and identity extractors.

pub mod auth;
pub mod identity;

pub use auth::{GateState, Identity, OptionalIdentity, authentication_gate, require_authority};
pub use identity::AuthenticatedIdentity;
