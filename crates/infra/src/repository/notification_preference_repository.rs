//! # NotificationPreferenceRepository
//!
//! ユーザー × 通知種別のメール受信設定の読み取り。設定の編集はこのサービスの範囲外。

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use vybbi_domain::{notification::NotificationPreference, user::UserId};

use crate::error::InfraError;

#[async_trait]
pub trait NotificationPreferenceRepository: Send + Sync {
    /// 受信設定を検索（行がなければ `None`）
    async fn find(
        &self,
        user_id: &UserId,
        notification_type: &str,
    ) -> Result<Option<NotificationPreference>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct NotificationPreferenceRow {
    user_id:           Uuid,
    notification_type: String,
    email_enabled:     bool,
}

/// PostgreSQL 実装の NotificationPreferenceRepository
#[derive(Debug, Clone)]
pub struct PostgresNotificationPreferenceRepository {
    pool: PgPool,
}

impl PostgresNotificationPreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationPreferenceRepository for PostgresNotificationPreferenceRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find(
        &self,
        user_id: &UserId,
        notification_type: &str,
    ) -> Result<Option<NotificationPreference>, InfraError> {
        let row = sqlx::query_as::<_, NotificationPreferenceRow>(
            r#"
            SELECT user_id, notification_type, email_enabled
            FROM notification_preferences
            WHERE user_id = $1 AND notification_type = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(notification_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| NotificationPreference {
            user_id:           UserId::from_uuid(row.user_id),
            notification_type: row.notification_type,
            email_enabled:     row.email_enabled,
        }))
    }
}
