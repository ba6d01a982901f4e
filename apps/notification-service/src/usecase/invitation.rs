//! # 代理人招待
//!
//! 招待の作成・応答・取消と、期限切れ招待の一括更新を行う。
//!
//! 未登録アーティストへの招待は、行を保存したうえで
//! `representation_invitation` のシステムメールを送る。
//! メール送信の失敗は招待作成の失敗とはしない。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use vybbi_domain::{
    DomainError,
    clock::Clock,
    notification::{EmailOutcome, NotificationType},
    representation::{
        InvitationId,
        Invitee,
        RepresentationInvitation,
        RepresentationRole,
    },
    user::UserId,
};
use vybbi_infra::repository::RepresentationInvitationRepository;
use vybbi_shared::{event_log::event, log_business_event};

use super::notification::{NotificationDispatcher, SendEmailInput};
use crate::error::ServiceError;

/// 招待作成の入力
#[derive(Debug, Clone)]
pub struct CreateInvitationInput {
    pub inviter_id:    UserId,
    pub inviter_name:  String,
    pub inviter_role:  RepresentationRole,
    pub artist_id:     Option<UserId>,
    pub invitee_email: Option<String>,
    pub invitee_name:  Option<String>,
}

/// 招待作成の結果
///
/// `email_outcome` はメール招待の場合のみ存在する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvitationCreated {
    pub invitation:    RepresentationInvitation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_outcome: Option<EmailOutcome>,
}

#[derive(Debug, Clone, Copy)]
enum Reply {
    Accept,
    Decline,
    Cancel,
}

pub struct InvitationUseCase {
    invitations: Arc<dyn RepresentationInvitationRepository>,
    dispatcher:  Arc<NotificationDispatcher>,
    clock:       Arc<dyn Clock>,
}

impl InvitationUseCase {
    pub fn new(
        invitations: Arc<dyn RepresentationInvitationRepository>,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            invitations,
            dispatcher,
            clock,
        }
    }

    /// 招待を作成する
    #[tracing::instrument(skip_all, fields(inviter_id = %input.inviter_id))]
    pub async fn create(
        &self,
        input: CreateInvitationInput,
    ) -> Result<InvitationCreated, ServiceError> {
        let inviter_name = input.inviter_name.trim().to_string();
        if inviter_name.is_empty() {
            return Err(ServiceError::Validation(
                "inviter_name は必須です".to_string(),
            ));
        }

        let invitee = Invitee::from_parts(input.artist_id, input.invitee_email, input.invitee_name)?;
        let invitation = RepresentationInvitation::new(
            input.inviter_id,
            input.inviter_role,
            &invitee,
            self.clock.now(),
        );

        self.invitations.insert(&invitation).await?;

        let role: &'static str = invitation.inviter_role.into();
        log_business_event!(
            event.category = event::category::REPRESENTATION,
            event.action = event::action::INVITATION_CREATED,
            event.entity_type = event::entity_type::REPRESENTATION_INVITATION,
            event.entity_id = %invitation.id,
            event.actor_id = %invitation.inviter_id,
            event.result = event::result::SUCCESS,
            invitation.role = role,
            "代理人招待を作成"
        );

        let email_outcome = match &invitee {
            Invitee::Artist { .. } => None,
            Invitee::Email { email, name } => Some(
                self.send_invitation_email(
                    &invitation,
                    &inviter_name,
                    email.as_str(),
                    name.as_deref(),
                )
                .await,
            ),
        };

        Ok(InvitationCreated {
            invitation,
            email_outcome,
        })
    }

    pub async fn accept(&self, id: &InvitationId) -> Result<RepresentationInvitation, ServiceError> {
        self.respond(id, Reply::Accept).await
    }

    pub async fn decline(&self, id: &InvitationId) -> Result<RepresentationInvitation, ServiceError> {
        self.respond(id, Reply::Decline).await
    }

    pub async fn cancel(&self, id: &InvitationId) -> Result<RepresentationInvitation, ServiceError> {
        self.respond(id, Reply::Cancel).await
    }

    /// 有効期限を過ぎた `pending` の招待をすべて `expired` にする
    #[tracing::instrument(skip_all)]
    pub async fn expire_stale(&self) -> Result<u64, ServiceError> {
        let expired = self.invitations.expire_stale(self.clock.now()).await?;

        if expired > 0 {
            log_business_event!(
                event.category = event::category::REPRESENTATION,
                event.action = event::action::INVITATION_EXPIRED,
                event.entity_type = event::entity_type::REPRESENTATION_INVITATION,
                event.result = event::result::SUCCESS,
                invitation.expired = expired,
                "期限切れの招待を更新"
            );
        }

        Ok(expired)
    }

    #[tracing::instrument(skip_all, fields(invitation_id = %id))]
    async fn respond(
        &self,
        id: &InvitationId,
        reply: Reply,
    ) -> Result<RepresentationInvitation, ServiceError> {
        let invitation = self
            .invitations
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "RepresentationInvitation",
                id:          id.to_string(),
            })?;

        let now = self.clock.now();
        if matches!(reply, Reply::Accept | Reply::Decline) && invitation.is_past_expiry(now) {
            return Err(self.close_expired(invitation, now).await);
        }

        let (updated, action) = match reply {
            Reply::Accept => (invitation.accept(now)?, event::action::INVITATION_ACCEPTED),
            Reply::Decline => (invitation.decline(now)?, event::action::INVITATION_DECLINED),
            Reply::Cancel => (invitation.cancel(now)?, event::action::INVITATION_CANCELLED),
        };

        // 読み込み後に別リクエストが応答済みにした場合
        if !self.invitations.update_status(&updated).await? {
            return Err(ServiceError::Conflict(format!(
                "招待 {id} は既に応答済みです"
            )));
        }

        log_business_event!(
            event.category = event::category::REPRESENTATION,
            event.action = action,
            event.entity_type = event::entity_type::REPRESENTATION_INVITATION,
            event.entity_id = %updated.id,
            event.result = event::result::SUCCESS,
            "代理人招待を更新"
        );

        Ok(updated)
    }

    /// 期限切れのまま `pending` で残っている招待を `expired` にし、応答を拒否するエラーを返す
    async fn close_expired(
        &self,
        invitation: RepresentationInvitation,
        now: DateTime<Utc>,
    ) -> ServiceError {
        let id = invitation.id.clone();
        let expired = match invitation.expire(now) {
            Ok(expired) => expired,
            Err(e) => return e.into(),
        };

        match self.invitations.update_status(&expired).await {
            Ok(true) => log_business_event!(
                event.category = event::category::REPRESENTATION,
                event.action = event::action::INVITATION_EXPIRED,
                event.entity_type = event::entity_type::REPRESENTATION_INVITATION,
                event.entity_id = %id,
                event.result = event::result::SUCCESS,
                "応答時に期限切れの招待を更新"
            ),
            Ok(false) => {}
            Err(e) => return e.into(),
        }

        ServiceError::Conflict(format!("招待 {id} は有効期限切れです"))
    }

    async fn send_invitation_email(
        &self,
        invitation: &RepresentationInvitation,
        inviter_name: &str,
        to: &str,
        invitee_name: Option<&str>,
    ) -> EmailOutcome {
        let input = SendEmailInput {
            to: to.to_string(),
            notification_type: NotificationType::RepresentationInvitation.to_string(),
            data: json!({
                "inviterName": inviter_name,
                "inviterRole": invitation.inviter_role.to_string(),
                "inviteeName": invitee_name,
                "invitationId": invitation.id.to_string(),
            }),
            system: true,
            ..SendEmailInput::default()
        };

        match self.dispatcher.send_email(input).await {
            Ok(receipt) => EmailOutcome::Sent {
                message_id: receipt.message_id,
            },
            Err(e) => {
                tracing::warn!(
                    invitation_id = %invitation.id,
                    error = %e,
                    "招待メールの送信に失敗（招待は保存済み）"
                );
                EmailOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use vybbi_domain::{clock::FixedClock, representation::InvitationStatus};
    use vybbi_infra::mock::{
        MockEmailTemplateRepository,
        MockEmailTransport,
        MockNotificationPreferenceRepository,
        MockNotificationRepository,
        MockRepresentationInvitationRepository,
        MockUserDirectory,
    };

    use super::*;
    use crate::usecase::notification::TemplateResolver;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    struct Fixture {
        invitations: MockRepresentationInvitationRepository,
        transport:   MockEmailTransport,
        clock:       Arc<FixedClock>,
        sut:         InvitationUseCase,
    }

    fn fixture_at(transport: MockEmailTransport, now: DateTime<Utc>) -> Fixture {
        let invitations = MockRepresentationInvitationRepository::new();
        let clock = Arc::new(FixedClock::new(now));
        let resolver = TemplateResolver::new(
            Arc::new(MockEmailTemplateRepository::new()),
            "https://vybbi.app",
        )
        .unwrap();
        let dispatcher = NotificationDispatcher::new(
            Arc::new(MockNotificationRepository::new()),
            Arc::new(MockNotificationPreferenceRepository::new()),
            Arc::new(MockUserDirectory::new()),
            Arc::new(resolver),
            Arc::new(transport.clone()),
            clock.clone(),
        );
        let sut = InvitationUseCase::new(
            Arc::new(invitations.clone()),
            Arc::new(dispatcher),
            clock.clone(),
        );

        Fixture {
            invitations,
            transport,
            clock,
            sut,
        }
    }

    fn fixture() -> Fixture {
        fixture_at(MockEmailTransport::new("resend"), fixed_now())
    }

    fn email_input() -> CreateInvitationInput {
        CreateInvitationInput {
            inviter_id:    UserId::new(),
            inviter_name:  "Jade Agency".to_string(),
            inviter_role:  RepresentationRole::Agent,
            artist_id:     None,
            invitee_email: Some("nova@example.com".to_string()),
            invitee_name:  Some("Nova".to_string()),
        }
    }

    #[tokio::test]
    async fn test_登録済みアーティストへの招待はメールを送らない() {
        let f = fixture();
        let input = CreateInvitationInput {
            artist_id: Some(UserId::new()),
            invitee_email: None,
            ..email_input()
        };

        let created = f.sut.create(input).await.unwrap();

        assert_eq!(created.email_outcome, None);
        assert_eq!(created.invitation.status, InvitationStatus::Pending);
        assert_eq!(created.invitation.expires_at, fixed_now() + Duration::days(7));
        assert_eq!(f.invitations.invitations().len(), 1);
        assert!(f.transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_メール招待は行を保存して招待メールを送る() {
        let f = fixture();

        let created = f.sut.create(email_input()).await.unwrap();

        assert_eq!(
            created.email_outcome,
            Some(EmailOutcome::Sent {
                message_id: "resend-1".to_string(),
            })
        );
        assert_eq!(
            created.invitation.invitee_email.as_deref(),
            Some("nova@example.com")
        );
        let sent = f.transport.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "nova@example.com");
        assert!(sent[0].html_body.contains("Jade Agency"));
        assert!(sent[0].html_body.contains(&created.invitation.id.to_string()));
    }

    #[tokio::test]
    async fn test_招待メールの送信失敗でも招待は残る() {
        let f = fixture_at(MockEmailTransport::rejecting("resend", 500), fixed_now());

        let created = f.sut.create(email_input()).await.unwrap();

        assert!(matches!(
            created.email_outcome,
            Some(EmailOutcome::Failed { .. })
        ));
        assert_eq!(f.invitations.invitations().len(), 1);
    }

    #[tokio::test]
    async fn test_招待先がなければバリデーションエラー() {
        let f = fixture();
        let input = CreateInvitationInput {
            invitee_email: None,
            ..email_input()
        };

        let result = f.sut.create(input).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(f.invitations.invitations().is_empty());
    }

    #[tokio::test]
    async fn test_pendingの招待を承認できる() {
        let f = fixture();
        let created = f.sut.create(email_input()).await.unwrap();

        let accepted = f.sut.accept(&created.invitation.id).await.unwrap();

        assert_eq!(accepted.status, InvitationStatus::Accepted);
        assert_eq!(accepted.responded_at, Some(fixed_now()));
        assert_eq!(
            f.invitations.invitations()[0].status,
            InvitationStatus::Accepted
        );
    }

    #[rstest]
    #[case::承認済みを辞退(Reply::Accept, Reply::Decline)]
    #[case::辞退済みを取消(Reply::Decline, Reply::Cancel)]
    #[case::取消済みを承認(Reply::Cancel, Reply::Accept)]
    #[tokio::test]
    async fn test_pending以外の招待は変更できない(
        #[case] first: Reply,
        #[case] second: Reply,
    ) {
        let f = fixture();
        let id = f.sut.create(email_input()).await.unwrap().invitation.id;
        f.sut.respond(&id, first).await.unwrap();

        let result = f.sut.respond(&id, second).await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[rstest]
    #[case::承認(Reply::Accept)]
    #[case::辞退(Reply::Decline)]
    #[tokio::test]
    async fn test_期限を過ぎた招待への応答は409で行はexpiredになる(#[case] reply: Reply) {
        let f = fixture();
        let id = f.sut.create(email_input()).await.unwrap().invitation.id;
        f.clock.advance(Duration::days(30));

        let error = f
            .sut
            .respond(&id, reply)
            .await
            .expect_err("期限切れの招待には応答できない");

        assert_eq!(error.status(), axum::http::StatusCode::CONFLICT);
        let rows = f.invitations.invitations();
        assert_eq!(rows[0].status, InvitationStatus::Expired);
    }

    #[tokio::test]
    async fn test_存在しない招待はnot_found() {
        let f = fixture();

        let result = f.sut.accept(&InvitationId::new()).await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_期限切れの招待のみexpiredになる() {
        let f = fixture();
        let artist_input = || CreateInvitationInput {
            artist_id: Some(UserId::new()),
            invitee_email: None,
            ..email_input()
        };
        f.sut.create(artist_input()).await.unwrap();
        f.clock.advance(Duration::days(8));
        f.sut.create(artist_input()).await.unwrap();

        let expired = f.sut.expire_stale().await.unwrap();

        assert_eq!(expired, 1);
        let rows = f.invitations.invitations();
        assert_eq!(rows[0].status, InvitationStatus::Expired);
        assert_eq!(rows[1].status, InvitationStatus::Pending);
    }
}
