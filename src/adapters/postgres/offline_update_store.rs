//! PostgreSQL implementation of OfflineUpdateStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UpdateId, UserId};
use crate::domain::realtime::{EventKind, OfflineUpdate};
use crate::ports::OfflineUpdateStore;

pub struct PostgresOfflineUpdateStore {
    pool: PgPool,
}

impl PostgresOfflineUpdateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an offline update.
#[derive(Debug, sqlx::FromRow)]
struct OfflineUpdateRow {
    id: Uuid,
    recipient: Uuid,
    origin: Uuid,
    kind: String,
    body: JsonValue,
    created_at: DateTime<Utc>,
}

impl TryFrom<OfflineUpdateRow> for OfflineUpdate {
    type Error = DomainError;

    fn try_from(row: OfflineUpdateRow) -> Result<Self, Self::Error> {
        let kind = EventKind::parse(&row.kind).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid event kind: {}", row.kind),
            )
        })?;

        Ok(OfflineUpdate {
            id: UpdateId::from_uuid(row.id),
            recipient: UserId::from_uuid(row.recipient),
            origin: UserId::from_uuid(row.origin),
            kind,
            payload: row.body,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl OfflineUpdateStore for PostgresOfflineUpdateStore {
    async fn insert(&self, update: &OfflineUpdate) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO offline_updates (id, recipient, origin, kind, body, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(update.id.as_uuid())
        .bind(update.recipient.as_uuid())
        .bind(update.origin.as_uuid())
        .bind(update.kind.as_str())
        .bind(&update.payload)
        .bind(update.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(DomainError::database)?;

        Ok(())
    }

    async fn get(&self, id: &UpdateId) -> Result<Option<OfflineUpdate>, DomainError> {
        let row: Option<OfflineUpdateRow> = sqlx::query_as(
            r#"
            SELECT id, recipient, origin, kind, body, created_at
            FROM offline_updates
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::database)?;

        row.map(OfflineUpdate::try_from).transpose()
    }

    async fn list_for_recipient(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<OfflineUpdate>, DomainError> {
        let rows: Vec<OfflineUpdateRow> = sqlx::query_as(
            r#"
            SELECT id, recipient, origin, kind, body, created_at
            FROM offline_updates
            WHERE recipient = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(recipient.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::database)?;

        rows.into_iter().map(OfflineUpdate::try_from).collect()
    }

    async fn remove(&self, recipient: &UserId, id: &UpdateId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM offline_updates WHERE id = $1 AND recipient = $2")
            .bind(id.as_uuid())
            .bind(recipient.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(DomainError::database)?;

        Ok(result.rows_affected() > 0)
    }
}
