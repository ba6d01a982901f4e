//! # InfluencerLinkRepository
//!
//! アフィリエイトリンクの永続化。`code` の一意性は UNIQUE 制約で担保し、
//! 重複時は [`InfraErrorKind::UniqueViolation`](crate::InfraErrorKind::UniqueViolation) を返す。

use async_trait::async_trait;
use sqlx::PgPool;
use vybbi_domain::affiliate::InfluencerLink;

use crate::error::InfraError;

#[async_trait]
pub trait InfluencerLinkRepository: Send + Sync {
    /// リンクを挿入する
    async fn insert(&self, link: &InfluencerLink) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の InfluencerLinkRepository
#[derive(Debug, Clone)]
pub struct PostgresInfluencerLinkRepository {
    pool: PgPool,
}

impl PostgresInfluencerLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InfluencerLinkRepository for PostgresInfluencerLinkRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(code = %link.code))]
    async fn insert(&self, link: &InfluencerLink) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO influencer_links (id, influencer_id, code, target_url, campaign, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(link.id.as_uuid())
        .bind(link.influencer_id.as_uuid())
        .bind(link.code.as_str())
        .bind(&link.target_url)
        .bind(&link.campaign)
        .bind(link.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
