//! # 通知ディスパッチャー
//!
//! 通知行の保存 → 宛先解決 → 受信設定確認 → テンプレート解決 → 送信 → 結果記録
//! を 1 回の呼び出しで行う。
//!
//! ## 設計方針
//!
//! - **保存が先**: 通知行の保存に失敗した場合のみエラーを返す
//! - **送信結果は値で返す**: 宛先なし・受信拒否・送信失敗は [`EmailOutcome`] として報告する
//! - **重複排除・再送なし**: 同じ要求が 2 回来れば 2 行保存し 2 通送る

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;
use vybbi_domain::{
    clock::Clock,
    notification::{
        DeliveryReceipt,
        EmailMessage,
        EmailOutcome,
        NewNotification,
        Notification,
        NotificationId,
        NotificationPayload,
        NotificationPreference,
        SkipReason,
    },
    user::{Email, UserId},
};
use vybbi_infra::{
    directory::UserDirectory,
    notification::EmailTransport,
    repository::{NotificationPreferenceRepository, NotificationRepository},
};
use vybbi_shared::{event_log::event, log_business_event};

use super::{ResolveRequest, TemplateResolver};
use crate::error::ServiceError;

/// 通知行を伴う配信要求
#[derive(Debug, Clone)]
pub struct DispatchInput {
    pub user_id:           UserId,
    pub notification_type: String,
    pub title:             String,
    pub message:           String,
    pub data:              Value,
    pub related_id:        Option<Uuid>,
}

/// 配信結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub notification_id: NotificationId,
    pub persisted:       bool,
    pub email_outcome:   EmailOutcome,
}

impl DispatchReport {
    pub fn email_sent(&self) -> bool {
        self.email_outcome.is_sent()
    }
}

/// 通知行を伴わないメール送信要求
#[derive(Debug, Clone, Default)]
pub struct SendEmailInput {
    pub to:                String,
    pub cc:                Vec<String>,
    pub bcc:               Vec<String>,
    pub reply_to:          Option<String>,
    pub notification_type: String,
    pub data:              Value,
    pub subject:           Option<String>,
    pub html:              Option<String>,
    pub is_test:           bool,
    /// システム通知（組み込みテンプレートのみ使う）
    pub system:            bool,
}

/// 通知ディスパッチャー
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationRepository>,
    preferences:   Arc<dyn NotificationPreferenceRepository>,
    directory:     Arc<dyn UserDirectory>,
    resolver:      Arc<TemplateResolver>,
    transport:     Arc<dyn EmailTransport>,
    clock:         Arc<dyn Clock>,
}

impl NotificationDispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        preferences: Arc<dyn NotificationPreferenceRepository>,
        directory: Arc<dyn UserDirectory>,
        resolver: Arc<TemplateResolver>,
        transport: Arc<dyn EmailTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notifications,
            preferences,
            directory,
            resolver,
            transport,
            clock,
        }
    }

    /// 通知行を保存し、可能であればメールを送信する
    ///
    /// 通知行の保存に失敗した場合のみ `Err` を返す。
    #[tracing::instrument(skip_all, fields(user_id = %input.user_id, notification_type = %input.notification_type))]
    pub async fn dispatch(&self, input: DispatchInput) -> Result<DispatchReport, ServiceError> {
        let notification = Notification::new(NewNotification {
            user_id: input.user_id,
            notification_type: input.notification_type,
            title: input.title,
            message: input.message,
            data: input.data,
            related_id: input.related_id,
            now: self.clock.now(),
        });

        self.notifications.insert(&notification).await?;

        log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_PERSISTED,
            event.entity_type = event::entity_type::NOTIFICATION,
            event.entity_id = %notification.id,
            event.actor_id = %notification.user_id,
            event.result = event::result::SUCCESS,
            notification.type_name = %notification.notification_type,
            "通知行を保存"
        );

        let email_outcome = self.deliver(&notification).await;

        Ok(DispatchReport {
            notification_id: notification.id,
            persisted: true,
            email_outcome,
        })
    }

    /// 指定アドレスへメールを送信する（通知行は作らない）
    #[tracing::instrument(skip_all, fields(notification_type = %input.notification_type, system = input.system))]
    pub async fn send_email(&self, input: SendEmailInput) -> Result<DeliveryReceipt, ServiceError> {
        let to = Email::new(input.to)?;
        let cc = validate_all(input.cc)?;
        let bcc = validate_all(input.bcc)?;
        let reply_to = input.reply_to.map(Email::new).transpose()?;
        let payload = NotificationPayload::from_request(&input.notification_type, input.data)?;

        let request = ResolveRequest {
            subject: input.subject.as_deref(),
            html: input.html.as_deref(),
            is_test: input.is_test,
            allow_stored: !input.system,
            ..ResolveRequest::new(&payload)
        };
        let resolved = self.resolver.resolve(request).await?;

        let message = EmailMessage {
            to: to.into_string(),
            cc,
            bcc,
            reply_to: reply_to.map(Email::into_string),
            subject: resolved.subject,
            html_body: resolved.html,
        };

        match self.transport.send(&message).await {
            Ok(receipt) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.result = event::result::SUCCESS,
                    notification.type_name = %payload.type_name(),
                    notification.recipient = %message.to,
                    notification.provider = receipt.provider,
                    notification.message_id = %receipt.message_id,
                    "メール送信成功"
                );
                Ok(receipt)
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.result = event::result::FAILURE,
                    notification.type_name = %payload.type_name(),
                    notification.recipient = %message.to,
                    error = %e,
                    "メール送信失敗"
                );
                Err(e.into())
            }
        }
    }

    async fn deliver(&self, notification: &Notification) -> EmailOutcome {
        let recipient = match self.directory.find_email(&notification.user_id).await {
            Ok(Some(email)) => email,
            Ok(None) => return skipped(notification, SkipReason::NoRecipientEmail),
            Err(e) => return failed(notification, format!("宛先の取得に失敗: {e}")),
        };

        let preference = match self
            .preferences
            .find(&notification.user_id, &notification.notification_type)
            .await
        {
            Ok(preference) => preference,
            Err(e) => return failed(notification, format!("受信設定の取得に失敗: {e}")),
        };
        if !NotificationPreference::allows_email(preference.as_ref()) {
            return skipped(notification, SkipReason::OptedOut);
        }

        let payload = match NotificationPayload::from_request(
            &notification.notification_type,
            template_data(notification),
        ) {
            Ok(payload) => payload,
            Err(e) => return failed(notification, e.to_string()),
        };
        let resolved = match self.resolver.resolve(ResolveRequest::new(&payload)).await {
            Ok(resolved) => resolved,
            Err(e) => return failed(notification, e.to_string()),
        };

        let message = EmailMessage::simple(recipient.as_str(), resolved.subject, resolved.html);
        let receipt = match self.transport.send(&message).await {
            Ok(receipt) => receipt,
            Err(e) => return failed(notification, e.to_string()),
        };

        if let Err(e) = self
            .notifications
            .mark_email_sent(&notification.id, self.clock.now())
            .await
        {
            tracing::error!(
                notification_id = %notification.id,
                error = %e,
                "メールは送信済みだが送信済みフラグの更新に失敗"
            );
        }

        log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_SENT,
            event.entity_type = event::entity_type::NOTIFICATION,
            event.entity_id = %notification.id,
            event.result = event::result::SUCCESS,
            notification.type_name = %notification.notification_type,
            notification.recipient = %recipient,
            notification.provider = receipt.provider,
            notification.message_id = %receipt.message_id,
            "通知メール送信成功"
        );

        EmailOutcome::Sent {
            message_id: receipt.message_id,
        }
    }
}

/// テンプレート用データ（`title` / `message` を補う）
fn template_data(notification: &Notification) -> Value {
    let mut data = match &notification.data {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => return other.clone(),
    };
    data.entry("title")
        .or_insert_with(|| Value::String(notification.title.clone()));
    data.entry("message")
        .or_insert_with(|| Value::String(notification.message.clone()));
    Value::Object(data)
}

fn validate_all(addresses: Vec<String>) -> Result<Vec<String>, ServiceError> {
    addresses
        .into_iter()
        .map(|a| {
            Email::new(a)
                .map(Email::into_string)
                .map_err(ServiceError::from)
        })
        .collect()
}

fn skipped(notification: &Notification, reason: SkipReason) -> EmailOutcome {
    let reason_str: &'static str = reason.into();
    log_business_event!(
        event.category = event::category::NOTIFICATION,
        event.action = event::action::NOTIFICATION_SKIPPED,
        event.entity_type = event::entity_type::NOTIFICATION,
        event.entity_id = %notification.id,
        event.result = event::result::SKIPPED,
        event.reason = reason_str,
        notification.type_name = %notification.notification_type,
        "通知メール送信を見送り"
    );
    EmailOutcome::Skipped { reason }
}

fn failed(notification: &Notification, error: String) -> EmailOutcome {
    log_business_event!(
        event.category = event::category::NOTIFICATION,
        event.action = event::action::NOTIFICATION_FAILED,
        event.entity_type = event::entity_type::NOTIFICATION,
        event.entity_id = %notification.id,
        event.result = event::result::FAILURE,
        notification.type_name = %notification.notification_type,
        error = %error,
        "通知メール送信失敗"
    );
    EmailOutcome::Failed { error }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use vybbi_domain::{clock::FixedClock, notification::NotificationError};
    use vybbi_infra::mock::{
        MockEmailTemplateRepository,
        MockEmailTransport,
        MockNotificationPreferenceRepository,
        MockNotificationRepository,
        MockUserDirectory,
    };

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    struct Fixture {
        notifications: MockNotificationRepository,
        preferences:   MockNotificationPreferenceRepository,
        transport:     MockEmailTransport,
        sut:           NotificationDispatcher,
    }

    fn fixture_with(
        notifications: MockNotificationRepository,
        directory: MockUserDirectory,
        transport: MockEmailTransport,
    ) -> Fixture {
        let preferences = MockNotificationPreferenceRepository::new();
        let resolver = TemplateResolver::new(
            Arc::new(MockEmailTemplateRepository::new()),
            "https://vybbi.app",
        )
        .unwrap();
        let sut = NotificationDispatcher::new(
            Arc::new(notifications.clone()),
            Arc::new(preferences.clone()),
            Arc::new(directory),
            Arc::new(resolver),
            Arc::new(transport.clone()),
            Arc::new(FixedClock::new(fixed_now())),
        );

        Fixture {
            notifications,
            preferences,
            transport,
            sut,
        }
    }

    fn input(user_id: &UserId) -> DispatchInput {
        DispatchInput {
            user_id:           user_id.clone(),
            notification_type: "message_received".to_string(),
            title:             "Nouveau message".to_string(),
            message:           "Sam vous a écrit".to_string(),
            data:              json!({ "senderName": "Sam", "messagePreview": "Salut !" }),
            related_id:        None,
        }
    }

    fn alice() -> Email {
        Email::new("alice@example.com").unwrap()
    }

    #[tokio::test]
    async fn test_送信に成功すると送信済みになる() {
        let user_id = UserId::new();
        let f = fixture_with(
            MockNotificationRepository::new(),
            MockUserDirectory::new().with_email(user_id.clone(), alice()),
            MockEmailTransport::new("resend"),
        );

        let report = f.sut.dispatch(input(&user_id)).await.unwrap();

        assert_eq!(
            report.email_outcome,
            EmailOutcome::Sent {
                message_id: "resend-1".to_string(),
            }
        );
        assert!(report.persisted);
        let rows = f.notifications.notifications();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].email_sent);
        assert_eq!(rows[0].email_sent_at, Some(fixed_now()));

        let sent = f.transport.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert_eq!(sent[0].subject, "Nouveau message de Sam");
    }

    #[tokio::test]
    async fn test_受信拒否なら保存のみで送信しない() {
        let user_id = UserId::new();
        let f = fixture_with(
            MockNotificationRepository::new(),
            MockUserDirectory::new().with_email(user_id.clone(), alice()),
            MockEmailTransport::new("resend"),
        );
        f.preferences.add(NotificationPreference {
            user_id:           user_id.clone(),
            notification_type: "message_received".to_string(),
            email_enabled:     false,
        });

        let report = f.sut.dispatch(input(&user_id)).await.unwrap();

        assert_eq!(
            report.email_outcome,
            EmailOutcome::Skipped {
                reason: SkipReason::OptedOut,
            }
        );
        assert!(!report.email_sent());
        assert!(f.transport.sent_messages().is_empty());
        let rows = f.notifications.notifications();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].email_sent);
    }

    #[tokio::test]
    async fn test_宛先がなければ保存のみで送信しない() {
        let f = fixture_with(
            MockNotificationRepository::new(),
            MockUserDirectory::new(),
            MockEmailTransport::new("resend"),
        );

        let report = f.sut.dispatch(input(&UserId::new())).await.unwrap();

        assert_eq!(
            report.email_outcome,
            EmailOutcome::Skipped {
                reason: SkipReason::NoRecipientEmail,
            }
        );
        assert!(f.transport.sent_messages().is_empty());
        assert_eq!(f.notifications.notifications().len(), 1);
    }

    #[tokio::test]
    async fn test_宛先取得エラーは失敗として報告し行は残す() {
        let f = fixture_with(
            MockNotificationRepository::new(),
            MockUserDirectory::failing(),
            MockEmailTransport::new("resend"),
        );

        let report = f.sut.dispatch(input(&UserId::new())).await.unwrap();

        assert!(matches!(report.email_outcome, EmailOutcome::Failed { .. }));
        assert_eq!(f.notifications.notifications().len(), 1);
    }

    #[tokio::test]
    async fn test_プロバイダ拒否は失敗として報告する() {
        let user_id = UserId::new();
        let f = fixture_with(
            MockNotificationRepository::new(),
            MockUserDirectory::new().with_email(user_id.clone(), alice()),
            MockEmailTransport::rejecting("resend", 422),
        );

        let report = f.sut.dispatch(input(&user_id)).await.unwrap();

        let EmailOutcome::Failed { error } = report.email_outcome else {
            panic!("Failed を期待: {:?}", report.email_outcome);
        };
        assert!(error.contains("422"), "{error}");
        assert!(!f.notifications.notifications()[0].email_sent);
    }

    #[tokio::test]
    async fn test_保存失敗はエラーを返し送信しない() {
        let user_id = UserId::new();
        let f = fixture_with(
            MockNotificationRepository::failing_insert(),
            MockUserDirectory::new().with_email(user_id.clone(), alice()),
            MockEmailTransport::new("resend"),
        );

        let result = f.sut.dispatch(input(&user_id)).await;

        assert!(matches!(result, Err(ServiceError::Infra(_))));
        assert!(f.transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_未知の種別はタイトルと本文つきのフォールバックで送る() {
        let user_id = UserId::new();
        let f = fixture_with(
            MockNotificationRepository::new(),
            MockUserDirectory::new().with_email(user_id.clone(), alice()),
            MockEmailTransport::new("resend"),
        );
        let input = DispatchInput {
            notification_type: "campaign_digest".to_string(),
            data: Value::Null,
            ..input(&user_id)
        };

        let report = f.sut.dispatch(input).await.unwrap();

        assert!(report.email_sent());
        let sent = f.transport.sent_messages();
        assert_eq!(sent[0].subject, "Notification Vybbi : campaign_digest");
        assert!(sent[0].html_body.contains("Sam vous a écrit"));
    }

    #[tokio::test]
    async fn test_必須フィールド欠落は失敗として報告する() {
        let user_id = UserId::new();
        let f = fixture_with(
            MockNotificationRepository::new(),
            MockUserDirectory::new().with_email(user_id.clone(), alice()),
            MockEmailTransport::new("resend"),
        );
        let input = DispatchInput {
            notification_type: "booking_request".to_string(),
            data: json!({ "artistName": "Nova" }),
            ..input(&user_id)
        };

        let report = f.sut.dispatch(input).await.unwrap();

        assert!(matches!(report.email_outcome, EmailOutcome::Failed { .. }));
        assert!(f.transport.sent_messages().is_empty());
        assert_eq!(f.notifications.notifications().len(), 1);
    }

    #[tokio::test]
    async fn test_send_emailはcc_bcc_reply_toを渡す() {
        let f = fixture_with(
            MockNotificationRepository::new(),
            MockUserDirectory::new(),
            MockEmailTransport::new("brevo"),
        );

        let receipt = f
            .sut
            .send_email(SendEmailInput {
                to: "artist@example.com".to_string(),
                cc: vec!["booker@example.com".to_string()],
                reply_to: Some("venue@example.com".to_string()),
                notification_type: "booking_request".to_string(),
                data: json!({ "artistName": "Nova", "venueName": "Le Trabendo", "eventDate": "2024-11-02" }),
                system: true,
                ..SendEmailInput::default()
            })
            .await
            .unwrap();

        assert_eq!(receipt.message_id, "brevo-1");
        let sent = f.transport.sent_messages();
        assert_eq!(sent[0].cc, vec!["booker@example.com".to_string()]);
        assert_eq!(sent[0].reply_to.as_deref(), Some("venue@example.com"));
        assert!(f.notifications.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_send_emailの不正な宛先はバリデーションエラー() {
        let f = fixture_with(
            MockNotificationRepository::new(),
            MockUserDirectory::new(),
            MockEmailTransport::new("resend"),
        );

        let result = f
            .sut
            .send_email(SendEmailInput {
                to: "not-an-email".to_string(),
                notification_type: "campaign_digest".to_string(),
                ..SendEmailInput::default()
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(f.transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_send_emailの送信失敗はエラーを返す() {
        let f = fixture_with(
            MockNotificationRepository::new(),
            MockUserDirectory::new(),
            MockEmailTransport::rejecting("resend", 503),
        );

        let result = f
            .sut
            .send_email(SendEmailInput {
                to: "alice@example.com".to_string(),
                notification_type: "campaign_digest".to_string(),
                subject: Some("Hello".to_string()),
                html: Some("<p>Hello</p>".to_string()),
                ..SendEmailInput::default()
            })
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Delivery(NotificationError::ProviderRejected {
                status: 503,
                ..
            }))
        ));
    }
}
