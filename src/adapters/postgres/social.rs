//! PostgreSQL implementations of the social store ports.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::social::{GuestVisit, Message};
use crate::ports::{BlacklistReader, GuestRepository, MessageRepository};

pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn insert(&self, message: &Message) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, origin, destination, text, invite, time)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.origin.as_uuid())
        .bind(message.destination.as_uuid())
        .bind(&message.text)
        .bind(message.invite)
        .bind(message.time.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(DomainError::database)?;

        Ok(())
    }
}

pub struct PostgresGuestRepository {
    pool: PgPool,
}

impl PostgresGuestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuestRepository for PostgresGuestRepository {
    async fn record_visit(&self, visit: &GuestVisit) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO guests (id, user_id, guest, time)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, guest) DO UPDATE SET time = EXCLUDED.time
            "#,
        )
        .bind(visit.id.as_uuid())
        .bind(visit.user.as_uuid())
        .bind(visit.guest.as_uuid())
        .bind(visit.time.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(DomainError::database)?;

        Ok(())
    }
}

pub struct PostgresBlacklistReader {
    pool: PgPool,
}

impl PostgresBlacklistReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlacklistReader for PostgresBlacklistReader {
    async fn is_blacklisted(&self, owner: &UserId, other: &UserId) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM blacklist WHERE owner = $1 AND target = $2)",
        )
        .bind(owner.as_uuid())
        .bind(other.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::database)?;

        Ok(exists)
    }
}
