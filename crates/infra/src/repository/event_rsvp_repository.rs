//! # EventRsvpRepository
//!
//! イベント参加表明の永続化。`(event_id, user_id)` が主キー。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use vybbi_domain::{
    event::{EventId, EventRsvp, RsvpStatus},
    user::UserId,
};

use crate::error::InfraError;

#[async_trait]
pub trait EventRsvpRepository: Send + Sync {
    async fn find(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<EventRsvp>, InfraError>;

    /// 作成または置き換える
    async fn upsert(&self, rsvp: &EventRsvp) -> Result<(), InfraError>;

    async fn delete(&self, event_id: &EventId, user_id: &UserId) -> Result<(), InfraError>;
}

#[derive(sqlx::FromRow)]
struct EventRsvpRow {
    event_id:   Uuid,
    user_id:    Uuid,
    status:     String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRsvpRow> for EventRsvp {
    type Error = InfraError;

    fn try_from(row: EventRsvpRow) -> Result<Self, Self::Error> {
        Ok(Self {
            event_id:   EventId::from_uuid(row.event_id),
            user_id:    UserId::from_uuid(row.user_id),
            status:     row
                .status
                .parse::<RsvpStatus>()
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL 実装の EventRsvpRepository
#[derive(Debug, Clone)]
pub struct PostgresEventRsvpRepository {
    pool: PgPool,
}

impl PostgresEventRsvpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRsvpRepository for PostgresEventRsvpRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<EventRsvp>, InfraError> {
        let row = sqlx::query_as::<_, EventRsvpRow>(
            r#"
            SELECT event_id, user_id, status, updated_at
            FROM event_rsvps
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(EventRsvp::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn upsert(&self, rsvp: &EventRsvp) -> Result<(), InfraError> {
        let status: &'static str = rsvp.status.into();
        sqlx::query(
            r#"
            INSERT INTO event_rsvps (event_id, user_id, status, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id, user_id) DO UPDATE
            SET status = EXCLUDED.status, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(rsvp.event_id.as_uuid())
        .bind(rsvp.user_id.as_uuid())
        .bind(status)
        .bind(rsvp.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn delete(&self, event_id: &EventId, user_id: &UserId) -> Result<(), InfraError> {
        sqlx::query("DELETE FROM event_rsvps WHERE event_id = $1 AND user_id = $2")
            .bind(event_id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
