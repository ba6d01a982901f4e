//! # 代理人招待
//!
//! エージェント / マネージャーがアーティストに代理人契約を申し込む招待。
//!
//! 招待先は登録済みアーティスト（`artist_id`）か、未登録のメールアドレス
//! （`invitee_email`）のいずれか。ステータスは `pending` からのみ遷移できる。
//!
//! ```text
//! pending ─┬─ accept  → accepted
//!          ├─ decline → declined
//!          ├─ cancel  → cancelled
//!          └─ expire  → expired
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    DomainError,
    user::{Email, UserId},
};

define_uuid_id! {
    /// 招待 ID
    pub struct InvitationId as "招待";
}

/// 招待の有効期間（日）
pub const INVITATION_TTL_DAYS: i64 = 7;

/// 招待者のロール
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RepresentationRole {
    Agent,
    Manager,
}

/// 招待ステータス
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
    Expired,
}

/// 招待先
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Invitee {
    /// 登録済みアーティスト
    Artist { artist_id: UserId },
    /// 未登録（メールで招待する）
    Email {
        email: Email,
        name:  Option<String>,
    },
}

impl Invitee {
    /// リクエストの `artist_id` / `invitee_email` から招待先を決める
    ///
    /// 両方指定された場合は登録済みアーティストを優先する。
    pub fn from_parts(
        artist_id: Option<UserId>,
        invitee_email: Option<String>,
        invitee_name: Option<String>,
    ) -> Result<Self, DomainError> {
        if let Some(artist_id) = artist_id {
            return Ok(Self::Artist { artist_id });
        }

        match invitee_email {
            Some(email) => Ok(Self::Email {
                email: Email::new(email)?,
                name:  invitee_name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty()),
            }),
            None => Err(DomainError::Validation(
                "artist_id または invitee_email のいずれかが必要です".to_string(),
            )),
        }
    }
}

/// 代理人招待
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentationInvitation {
    pub id:            InvitationId,
    pub inviter_id:    UserId,
    pub inviter_role:  RepresentationRole,
    pub artist_id:     Option<UserId>,
    pub invitee_email: Option<String>,
    pub status:        InvitationStatus,
    pub created_at:    DateTime<Utc>,
    pub expires_at:    DateTime<Utc>,
    pub responded_at:  Option<DateTime<Utc>>,
}

impl RepresentationInvitation {
    /// `pending` の招待を作成する
    pub fn new(
        inviter_id: UserId,
        inviter_role: RepresentationRole,
        invitee: &Invitee,
        now: DateTime<Utc>,
    ) -> Self {
        let (artist_id, invitee_email) = match invitee {
            Invitee::Artist { artist_id } => (Some(artist_id.clone()), None),
            Invitee::Email { email, .. } => (None, Some(email.as_str().to_string())),
        };

        Self {
            id: InvitationId::new(),
            inviter_id,
            inviter_role,
            artist_id,
            invitee_email,
            status: InvitationStatus::Pending,
            created_at: now,
            expires_at: now + Duration::days(INVITATION_TTL_DAYS),
            responded_at: None,
        }
    }

    /// 招待先が承諾する
    ///
    /// 有効期限を過ぎた招待は `pending` のままでもエラー。
    pub fn accept(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.ensure_within_expiry(now)?;
        self.transition(InvitationStatus::Accepted, now)
    }

    /// 招待先が辞退する（期限の扱いは承諾と同じ）
    pub fn decline(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.ensure_within_expiry(now)?;
        self.transition(InvitationStatus::Declined, now)
    }

    pub fn cancel(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.transition(InvitationStatus::Cancelled, now)
    }

    /// 有効期限切れにする
    ///
    /// 期限前の招待はエラー。
    pub fn expire(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if !self.is_past_expiry(now) {
            return Err(DomainError::Conflict(format!(
                "招待 {} はまだ有効期限内です",
                self.id
            )));
        }
        self.transition(InvitationStatus::Expired, now)
    }

    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    fn ensure_within_expiry(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.is_past_expiry(now) {
            return Err(DomainError::Conflict(format!(
                "招待 {} は有効期限切れです（期限: {}）",
                self.id, self.expires_at
            )));
        }
        Ok(())
    }

    fn transition(self, to: InvitationStatus, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if self.status != InvitationStatus::Pending {
            return Err(DomainError::Conflict(format!(
                "招待 {} は {} のため {} にできません",
                self.id, self.status, to
            )));
        }

        Ok(Self {
            status: to,
            responded_at: Some(now),
            ..self
        })
    }
}
