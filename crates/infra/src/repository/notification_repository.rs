//! # NotificationRepository
//!
//! 通知行の永続化を担当するリポジトリ。
//!
//! 通知行は配信要求ごとに INSERT され、メール送信成功時に一度だけ
//! `email_sent` が更新される。削除は行わない。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use vybbi_domain::{
    notification::{Notification, NotificationId},
    user::UserId,
};

use crate::error::InfraError;

/// 通知リポジトリトレイト
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 通知行を挿入する
    async fn insert(&self, notification: &Notification) -> Result<(), InfraError>;

    /// メール送信済みにする
    async fn mark_email_sent(
        &self,
        id: &NotificationId,
        sent_at: DateTime<Utc>,
    ) -> Result<(), InfraError>;

    /// ID で通知行を検索
    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, InfraError>;
}

/// notifications テーブルの行
#[derive(sqlx::FromRow)]
struct NotificationRow {
    id:            Uuid,
    user_id:       Uuid,
    #[sqlx(rename = "type")]
    type_name:     String,
    title:         String,
    message:       String,
    data:          serde_json::Value,
    related_id:    Option<Uuid>,
    email_sent:    bool,
    email_sent_at: Option<DateTime<Utc>>,
    created_at:    DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            notification_type: row.type_name,
            title: row.title,
            message: row.message,
            data: row.data,
            related_id: row.related_id,
            email_sent: row.email_sent,
            email_sent_at: row.email_sent_at,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL 実装の NotificationRepository
#[derive(Debug, Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(&self, notification: &Notification) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, user_id, type, title, message, data,
                related_id, email_sent, email_sent_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(notification.id.as_uuid())
        .bind(notification.user_id.as_uuid())
        .bind(&notification.notification_type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.data)
        .bind(notification.related_id)
        .bind(notification.email_sent)
        .bind(notification.email_sent_at)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %id))]
    async fn mark_email_sent(
        &self,
        id: &NotificationId,
        sent_at: DateTime<Utc>,
    ) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET email_sent = TRUE, email_sent_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(sent_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %id))]
    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, InfraError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT
                id, user_id, type, title, message, data,
                related_id, email_sent, email_sent_at, created_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Notification::from))
    }
}
