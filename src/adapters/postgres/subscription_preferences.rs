//! PostgreSQL implementation of SubscriptionPreferences.
//!
//! A missing row means the user never opted in.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::realtime::SubscriptionTopic;
use crate::ports::SubscriptionPreferences;

pub struct PostgresSubscriptionPreferences {
    pool: PgPool,
}

impl PostgresSubscriptionPreferences {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionPreferences for PostgresSubscriptionPreferences {
    async fn is_subscribed(
        &self,
        user_id: &UserId,
        topic: SubscriptionTopic,
    ) -> Result<bool, DomainError> {
        let subscribed: Option<bool> = sqlx::query_scalar(
            "SELECT subscribed FROM subscriptions WHERE user_id = $1 AND topic = $2",
        )
        .bind(user_id.as_uuid())
        .bind(topic.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::database)?;

        Ok(subscribed.unwrap_or(false))
    }
}
