//! Authentication and session error types.
//!
//! This module defines all error types that can occur during authentication
//! and session lifecycle operations.

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur during authentication and session operations.
///
/// Token-decode failures keep their `TokenExpired`/`TokenInvalid` split
/// inside the crate so internal paths can branch on it; at the HTTP boundary
/// both render as a generic authentication failure (see the `IntoResponse`
/// impl below).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The presented credentials or token could not be verified.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Description of why authentication failed. Logged, never sent to clients.
        message: String,
    },

    /// The authenticated caller lacks the authority for the action.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of why access is forbidden.
        message: String,
    },

    /// A referenced entity does not exist.
    #[error("{resource} not found")]
    NotFound {
        /// The kind of entity that was looked up.
        resource: String,
    },

    /// The request input is malformed or missing required fields.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid input.
        message: String,
    },

    /// The token is correctly signed but past its expiry.
    #[error("Token expired")]
    TokenExpired,

    /// The token is malformed, incorrectly signed, or of the wrong shape.
    #[error("Invalid token: {message}")]
    TokenInvalid {
        /// Description of why the token is invalid.
        message: String,
    },

    /// An error occurred while storing or retrieving session data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Authentication` error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a new `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a new `TokenInvalid` error.
    #[must_use]
    pub fn token_invalid(message: impl Into<String>) -> Self {
        Self::TokenInvalid {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::Forbidden { .. }
                | Self::NotFound { .. }
                | Self::InvalidArgument { .. }
                | Self::TokenExpired
                | Self::TokenInvalid { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. }
        )
    }

    /// Returns `true` if this error surfaces as an authentication failure.
    ///
    /// Note that the token variants count: expired and malformed tokens are
    /// indistinguishable from bad credentials outside this crate.
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::TokenExpired | Self::TokenInvalid { .. }
        )
    }

    /// Returns `true` if this is a token-decode error.
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(self, Self::TokenExpired | Self::TokenInvalid { .. })
    }

    /// Returns the HTTP status this error renders as.
    ///
    /// All token-decode failures collapse to 401 here: callers get no signal
    /// distinguishing "expired, please refresh" from "forged".
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication { .. } | Self::TokenExpired | Self::TokenInvalid { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message sent to clients.
    ///
    /// Authentication failures and server errors are deliberately generic:
    /// the detailed message is logged, never sent.
    fn public_message(&self) -> String {
        match self {
            Self::Authentication { .. } | Self::TokenExpired | Self::TokenInvalid { .. } => {
                "Authentication failed".to_string()
            }
            Self::Forbidden { .. } => "Forbidden".to_string(),
            Self::NotFound { resource } => format!("{resource} not found"),
            Self::InvalidArgument { message } => message.clone(),
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Forbidden { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidArgument { .. } => ErrorCategory::Validation,
            Self::TokenExpired => ErrorCategory::Token,
            Self::TokenInvalid { .. } => ErrorCategory::Token,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of authentication errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Identity verification failures.
    Authentication,
    /// Permission check failures.
    Authorization,
    /// Token validation and expiration failures.
    Token,
    /// Request validation failures.
    Validation,
    /// Missing entity lookups.
    NotFound,
    /// Infrastructure/storage failures.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_server_error() {
            tracing::error!(error = %self, category = %self.category(), "request failed");
        } else {
            tracing::debug!(error = %self, category = %self.category(), "request rejected");
        }

        let body = serde_json::json!({
            "error": self.public_message(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
