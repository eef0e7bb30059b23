//! Signed-token encode/decode with a shared symmetric secret.
//!
//! Both token kinds are signed HS256 with one secret and distinguished only
//! by their `kind` claim. Possession of the secret therefore compromises
//! both lifelines equally; the secret is handled only here and in
//! configuration loading.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use time::OffsetDateTime;

use oxcart_core::User;

use crate::error::AuthError;
use crate::token::claims::{TokenClaims, TokenKind};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while encoding or decoding tokens.
///
/// `Expired` and `Invalid` stay distinguishable inside the crate because
/// expired-but-correctly-signed tokens are routine, not attacks. Outside the
/// crate both collapse into an authentication failure.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    Encoding {
        /// Description of the encoding error.
        message: String,
    },

    /// The token is malformed, incorrectly signed, or structurally wrong.
    #[error("Invalid token: {message}")]
    Invalid {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The token is correctly signed but past its expiry.
    #[error("Token expired")]
    Expired,
}

impl TokenError {
    /// Creates a new `Encoding` error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Creates a new `Invalid` error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Returns `true` if the token was rejected only for being expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::invalid(err.to_string()),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::Invalid { message } => Self::TokenInvalid { message },
            TokenError::Encoding { message } => Self::Internal { message },
        }
    }
}

// ============================================================================
// Token Codec
// ============================================================================

/// Encodes and decodes signed bearer tokens.
///
/// This codec is thread-safe (`Send + Sync`) and can be shared across async
/// tasks. It has no storage dependency: revocation and blacklist checks live
/// in the session manager.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: std::time::Duration,
    refresh_ttl: std::time::Duration,
}

impl TokenCodec {
    /// Creates a new codec from the shared signing secret and token lifetimes.
    #[must_use]
    pub fn new(
        secret: impl AsRef<[u8]>,
        access_ttl: std::time::Duration,
        refresh_ttl: std::time::Duration,
    ) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Creates a codec from the auth configuration.
    #[must_use]
    pub fn from_config(config: &crate::config::AuthConfig) -> Self {
        Self::new(
            config.signing_secret.as_bytes(),
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    /// Returns the configured access token lifetime.
    #[must_use]
    pub fn access_ttl(&self) -> std::time::Duration {
        self.access_ttl
    }

    /// Returns the configured refresh token lifetime.
    #[must_use]
    pub fn refresh_ttl(&self) -> std::time::Duration {
        self.refresh_ttl
    }

    /// Issues an access token for a user.
    ///
    /// Pure function of the user, the current time, and the secret: no
    /// storage side effects.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let claims = TokenClaims::access(user, now, now + self.access_ttl);
        self.encode(&claims)
    }

    /// Issues a refresh token for a user, embedding a fresh unique id.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue_refresh_token(&self, user: &User) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let claims = TokenClaims::refresh(user, now, now + self.refresh_ttl);
        self.encode(&claims)
    }

    /// Encodes arbitrary claims into a signed token string.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::encoding(e.to_string()))
    }

    /// Decodes and fully validates a token string.
    ///
    /// # Errors
    /// Returns `TokenError::Expired` for a correctly signed token past its
    /// expiry and `TokenError::Invalid` for anything else that fails.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let validation = self.validation(true);
        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Decodes a token without checking expiry. The signature is still
    /// verified. Used when blacklisting, where the real expiry of an
    /// already-expired token is still needed.
    ///
    /// # Errors
    /// Returns `TokenError::Invalid` if the signature or structure is wrong.
    pub fn decode_allow_expired(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let validation = self.validation(false);
        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Returns `true` if the token cannot be used because its expiry has
    /// passed. Any other decode failure also counts as expired, so a
    /// malformed token never reads as usable.
    #[must_use]
    pub fn is_expired(&self, token: &str) -> bool {
        match self.decode(token) {
            Ok(_) => false,
            Err(TokenError::Expired) => true,
            Err(_) => true,
        }
    }

    /// Validates an access token against a specific user.
    ///
    /// True only if the token decodes, is of access kind, and its subject is
    /// the user's email. Expiry and signature are covered by the decode.
    #[must_use]
    pub fn validate_access_token(&self, token: &str, user: &User) -> bool {
        match self.decode(token) {
            Ok(claims) => claims.kind == TokenKind::Access && claims.sub == user.email,
            Err(_) => false,
        }
    }

    /// Validates a refresh token's shape: decodes and is of refresh kind.
    ///
    /// Does not consult the revocation store; that check belongs to the
    /// session manager so this codec stays storage-free.
    #[must_use]
    pub fn validate_refresh_token(&self, token: &str) -> bool {
        match self.decode(token) {
            Ok(claims) => claims.kind == TokenKind::Refresh,
            Err(_) => false,
        }
    }

    fn validation(&self, validate_exp: bool) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = validate_exp;
        validation.validate_aud = false;
        // Expiry is exact: no clock leeway.
        validation.leeway = 0;
        validation
    }
}

// ============================================================================
// Tests
// ============================================================================
