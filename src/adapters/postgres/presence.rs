//! PostgreSQL implementation of PresenceReader.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::PresenceReader;

pub struct PostgresPresenceReader {
    pool: PgPool,
}

impl PostgresPresenceReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PresenceReader for PostgresPresenceReader {
    async fn is_online(&self, user_id: &UserId) -> Result<bool, DomainError> {
        let online: Option<bool> = sqlx::query_scalar("SELECT online FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(DomainError::database)?;

        online.ok_or_else(|| {
            DomainError::new(ErrorCode::UserNotFound, "User not found")
                .with_detail("user_id", user_id.to_string())
        })
    }
}
