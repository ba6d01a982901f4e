//! # RepresentationInvitationRepository
//!
//! 代理人招待の永続化。ステータス更新は `pending` の行にのみ適用する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use vybbi_domain::{
    representation::{
        InvitationId,
        InvitationStatus,
        RepresentationInvitation,
        RepresentationRole,
    },
    user::UserId,
};

use crate::error::InfraError;

#[async_trait]
pub trait RepresentationInvitationRepository: Send + Sync {
    async fn insert(&self, invitation: &RepresentationInvitation) -> Result<(), InfraError>;

    async fn find_by_id(
        &self,
        id: &InvitationId,
    ) -> Result<Option<RepresentationInvitation>, InfraError>;

    /// `pending` の行のステータスと応答日時を更新する
    ///
    /// 並行して別の遷移が先に適用されていた場合は `false` を返す。
    async fn update_status(&self, invitation: &RepresentationInvitation)
    -> Result<bool, InfraError>;

    /// 期限切れの `pending` をすべて `expired` にし、件数を返す
    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, InfraError>;
}

#[derive(sqlx::FromRow)]
struct RepresentationInvitationRow {
    id:            Uuid,
    inviter_id:    Uuid,
    inviter_role:  String,
    artist_id:     Option<Uuid>,
    invitee_email: Option<String>,
    status:        String,
    created_at:    DateTime<Utc>,
    expires_at:    DateTime<Utc>,
    responded_at:  Option<DateTime<Utc>>,
}

impl TryFrom<RepresentationInvitationRow> for RepresentationInvitation {
    type Error = InfraError;

    fn try_from(row: RepresentationInvitationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id:            InvitationId::from_uuid(row.id),
            inviter_id:    UserId::from_uuid(row.inviter_id),
            inviter_role:  row
                .inviter_role
                .parse::<RepresentationRole>()
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            artist_id:     row.artist_id.map(UserId::from_uuid),
            invitee_email: row.invitee_email,
            status:        row
                .status
                .parse::<InvitationStatus>()
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            created_at:    row.created_at,
            expires_at:    row.expires_at,
            responded_at:  row.responded_at,
        })
    }
}

/// PostgreSQL 実装の RepresentationInvitationRepository
#[derive(Debug, Clone)]
pub struct PostgresRepresentationInvitationRepository {
    pool: PgPool,
}

impl PostgresRepresentationInvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RepresentationInvitationRepository for PostgresRepresentationInvitationRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(id = %invitation.id))]
    async fn insert(&self, invitation: &RepresentationInvitation) -> Result<(), InfraError> {
        let role: &'static str = invitation.inviter_role.into();
        let status: &'static str = invitation.status.into();

        sqlx::query(
            r#"
            INSERT INTO representation_invitations (
                id, inviter_id, inviter_role, artist_id, invitee_email,
                status, created_at, expires_at, responded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(invitation.id.as_uuid())
        .bind(invitation.inviter_id.as_uuid())
        .bind(role)
        .bind(invitation.artist_id.as_ref().map(|id| *id.as_uuid()))
        .bind(&invitation.invitee_email)
        .bind(status)
        .bind(invitation.created_at)
        .bind(invitation.expires_at)
        .bind(invitation.responded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %id))]
    async fn find_by_id(
        &self,
        id: &InvitationId,
    ) -> Result<Option<RepresentationInvitation>, InfraError> {
        let row = sqlx::query_as::<_, RepresentationInvitationRow>(
            r#"
            SELECT
                id, inviter_id, inviter_role, artist_id, invitee_email,
                status, created_at, expires_at, responded_at
            FROM representation_invitations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(RepresentationInvitation::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %invitation.id))]
    async fn update_status(
        &self,
        invitation: &RepresentationInvitation,
    ) -> Result<bool, InfraError> {
        let status: &'static str = invitation.status.into();

        let result = sqlx::query(
            r#"
            UPDATE representation_invitations
            SET status = $2, responded_at = $3
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(invitation.id.as_uuid())
        .bind(status)
        .bind(invitation.responded_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE representation_invitations
            SET status = 'expired', responded_at = $1
            WHERE status = 'pending' AND expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
