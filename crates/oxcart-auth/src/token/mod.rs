//! Token claims and the signed-token codec.

pub mod claims;
pub mod codec;

pub use claims::{TokenClaims, TokenKind};
pub use codec::{TokenCodec, TokenError};
