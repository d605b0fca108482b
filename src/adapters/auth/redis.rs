//! Redis-backed token validator.
//!
//! The authentication service stores issued session tokens in one hash:
//!
//! ```text
//! HSET <namespace>:tokens <token> <userIdHex>
//! ```

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{AccessToken, AuthError, AuthenticatedUser, UserId};
use crate::ports::TokenValidator;

/// Hash name suffix holding token → user id.
pub const TOKEN_HASH: &str = "tokens";

#[derive(Clone)]
pub struct RedisTokenValidator {
    conn: MultiplexedConnection,
    hash_key: String,
}

impl RedisTokenValidator {
    pub fn new(conn: MultiplexedConnection, namespace: &str) -> Self {
        Self {
            conn,
            hash_key: token_hash_key(namespace),
        }
    }
}

fn token_hash_key(namespace: &str) -> String {
    format!("{}:{}", namespace, TOKEN_HASH)
}

#[async_trait]
impl TokenValidator for RedisTokenValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let mut conn = self.conn.clone();
        let stored: Option<String> = conn
            .hget(&self.hash_key, token)
            .await
            .map_err(|e: redis::RedisError| AuthError::service_unavailable(e.to_string()))?;

        let raw = stored.ok_or(AuthError::InvalidToken)?;
        let user_id = UserId::parse(&raw).map_err(|e| {
            tracing::warn!(error = %e, "Token maps to malformed user id");
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser::new(user_id, AccessToken::new(token)))
    }
}
