//! Authentication types for the domain layer.
//!
//! An `AuthenticatedUser` is produced by the `TokenValidator` port from an
//! opaque session token. The realtime endpoint echoes the token back to the
//! client as its handshake, so the token travels with the user but stays
//! wrapped in a `Secret` everywhere else (it never appears in `Debug` output
//! or logs).

use secrecy::{ExposeSecret, Secret};
use std::fmt;
use thiserror::Error;

use super::UserId;

/// Opaque session token issued by the authentication collaborator.
#[derive(Clone)]
pub struct AccessToken(Secret<String>);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Secret::new(token.into()))
    }

    /// Returns the raw token. Only the handshake and validators need this.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Authenticated caller resolved from a session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub token: AccessToken,
}

impl AuthenticatedUser {
    pub fn new(id: UserId, token: AccessToken) -> Self {
        Self { id, token }
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, unknown, or malformed.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token store is unavailable (network, config, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
