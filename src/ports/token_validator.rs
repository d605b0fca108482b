//! Token validation port.
//!
//! Resolves an opaque session token (issued by the authentication
//! collaborator at login) to the user it belongs to.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates session tokens and extracts user identity.
///
/// # Contract
///
/// - `Err(AuthError::InvalidToken)` for unknown or malformed tokens
/// - `Err(AuthError::ServiceUnavailable)` for transient store failures
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
