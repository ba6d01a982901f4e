//! # EmailTemplateRepository
//!
//! 組み込みテンプレートを上書きする DB テンプレートの永続化。
//! 種別ごとに 1 行（`type` が主キー）。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vybbi_domain::email_template::EmailTemplate;

use crate::error::InfraError;

#[async_trait]
pub trait EmailTemplateRepository: Send + Sync {
    /// 有効なテンプレートを検索（無効化されている場合は `None`）
    async fn find_active(&self, notification_type: &str)
    -> Result<Option<EmailTemplate>, InfraError>;

    /// 全テンプレート（無効なものも含む）を種別順に取得
    async fn find_all(&self) -> Result<Vec<EmailTemplate>, InfraError>;

    /// 種別をキーに作成または更新する
    async fn upsert(&self, template: &EmailTemplate) -> Result<(), InfraError>;
}

#[derive(sqlx::FromRow)]
struct EmailTemplateRow {
    #[sqlx(rename = "type")]
    type_name:    String,
    subject:      String,
    html_content: String,
    is_active:    bool,
    updated_at:   DateTime<Utc>,
}

impl From<EmailTemplateRow> for EmailTemplate {
    fn from(row: EmailTemplateRow) -> Self {
        Self {
            notification_type: row.type_name,
            subject:           row.subject,
            html_content:      row.html_content,
            is_active:         row.is_active,
            updated_at:        row.updated_at,
        }
    }
}

/// PostgreSQL 実装の EmailTemplateRepository
#[derive(Debug, Clone)]
pub struct PostgresEmailTemplateRepository {
    pool: PgPool,
}

impl PostgresEmailTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailTemplateRepository for PostgresEmailTemplateRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_active(
        &self,
        notification_type: &str,
    ) -> Result<Option<EmailTemplate>, InfraError> {
        let row = sqlx::query_as::<_, EmailTemplateRow>(
            r#"
            SELECT type, subject, html_content, is_active, updated_at
            FROM email_templates
            WHERE type = $1 AND is_active
            "#,
        )
        .bind(notification_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EmailTemplate::from))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<EmailTemplate>, InfraError> {
        let rows = sqlx::query_as::<_, EmailTemplateRow>(
            r#"
            SELECT type, subject, html_content, is_active, updated_at
            FROM email_templates
            ORDER BY type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EmailTemplate::from).collect())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn upsert(&self, template: &EmailTemplate) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO email_templates (type, subject, html_content, is_active, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (type) DO UPDATE
            SET subject = EXCLUDED.subject,
                html_content = EXCLUDED.html_content,
                is_active = EXCLUDED.is_active,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&template.notification_type)
        .bind(&template.subject)
        .bind(&template.html_content)
        .bind(template.is_active)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
