//! # テスト用モック
//!
//! ユースケーステスト・ハンドラテストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! vybbi-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vybbi_domain::{
    affiliate::InfluencerLink,
    email_template::EmailTemplate,
    event::{EventId, EventRsvp},
    notification::{
        DeliveryReceipt,
        EmailMessage,
        Notification,
        NotificationError,
        NotificationId,
        NotificationPreference,
    },
    representation::{InvitationId, InvitationStatus, RepresentationInvitation},
    user::{Email, UserId},
};

use crate::{
    directory::UserDirectory,
    error::InfraError,
    notification::EmailTransport,
    repository::{
        EmailTemplateRepository,
        EventRsvpRepository,
        InfluencerLinkRepository,
        NotificationPreferenceRepository,
        NotificationRepository,
        RepresentationInvitationRepository,
    },
};

// ===== MockNotificationRepository =====

#[derive(Clone, Default)]
pub struct MockNotificationRepository {
    notifications: Arc<Mutex<Vec<Notification>>>,
    fail_insert:   bool,
}

impl MockNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// INSERT が常に失敗するリポジトリ
    pub fn failing_insert() -> Self {
        Self {
            fail_insert: true,
            ..Self::default()
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationRepository for MockNotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<(), InfraError> {
        if self.fail_insert {
            return Err(InfraError::unexpected("insert failed"));
        }
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }

    async fn mark_email_sent(
        &self,
        id: &NotificationId,
        sent_at: DateTime<Utc>,
    ) -> Result<(), InfraError> {
        let mut notifications = self.notifications.lock().unwrap();
        if let Some(n) = notifications.iter_mut().find(|n| &n.id == id) {
            *n = n.clone().mark_email_sent(sent_at);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, InfraError> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .find(|n| &n.id == id)
            .cloned())
    }
}

// ===== MockNotificationPreferenceRepository =====

#[derive(Clone, Default)]
pub struct MockNotificationPreferenceRepository {
    preferences: Arc<Mutex<Vec<NotificationPreference>>>,
}

impl MockNotificationPreferenceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, preference: NotificationPreference) {
        self.preferences.lock().unwrap().push(preference);
    }
}

#[async_trait]
impl NotificationPreferenceRepository for MockNotificationPreferenceRepository {
    async fn find(
        &self,
        user_id: &UserId,
        notification_type: &str,
    ) -> Result<Option<NotificationPreference>, InfraError> {
        Ok(self
            .preferences
            .lock()
            .unwrap()
            .iter()
            .find(|p| &p.user_id == user_id && p.notification_type == notification_type)
            .cloned())
    }
}

// ===== MockEmailTemplateRepository =====

#[derive(Clone, Default)]
pub struct MockEmailTemplateRepository {
    templates: Arc<Mutex<Vec<EmailTemplate>>>,
}

impl MockEmailTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn templates(&self) -> Vec<EmailTemplate> {
        self.templates.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailTemplateRepository for MockEmailTemplateRepository {
    async fn find_active(
        &self,
        notification_type: &str,
    ) -> Result<Option<EmailTemplate>, InfraError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.notification_type == notification_type && t.is_active)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<EmailTemplate>, InfraError> {
        let mut templates = self.templates();
        templates.sort_by(|a, b| a.notification_type.cmp(&b.notification_type));
        Ok(templates)
    }

    async fn upsert(&self, template: &EmailTemplate) -> Result<(), InfraError> {
        let mut templates = self.templates.lock().unwrap();
        templates.retain(|t| t.notification_type != template.notification_type);
        templates.push(template.clone());
        Ok(())
    }
}

// ===== MockInfluencerLinkRepository =====

#[derive(Clone, Default)]
pub struct MockInfluencerLinkRepository {
    links:           Arc<Mutex<Vec<InfluencerLink>>>,
    fail_unexpected: bool,
}

impl MockInfluencerLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 一意制約違反以外の DB エラーを返すリポジトリ
    pub fn failing() -> Self {
        Self {
            fail_unexpected: true,
            ..Self::default()
        }
    }

    pub fn links(&self) -> Vec<InfluencerLink> {
        self.links.lock().unwrap().clone()
    }
}

#[async_trait]
impl InfluencerLinkRepository for MockInfluencerLinkRepository {
    async fn insert(&self, link: &InfluencerLink) -> Result<(), InfraError> {
        if self.fail_unexpected {
            return Err(InfraError::unexpected("connection reset"));
        }

        let mut links = self.links.lock().unwrap();
        if links.iter().any(|l| l.code == link.code) {
            return Err(InfraError::unique_violation(Some(
                "influencer_links_code_key".to_string(),
            )));
        }
        links.push(link.clone());
        Ok(())
    }
}

// ===== MockEventRsvpRepository =====

#[derive(Clone, Default)]
pub struct MockEventRsvpRepository {
    rsvps: Arc<Mutex<Vec<EventRsvp>>>,
}

impl MockEventRsvpRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rsvps(&self) -> Vec<EventRsvp> {
        self.rsvps.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRsvpRepository for MockEventRsvpRepository {
    async fn find(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<EventRsvp>, InfraError> {
        Ok(self
            .rsvps
            .lock()
            .unwrap()
            .iter()
            .find(|r| &r.event_id == event_id && &r.user_id == user_id)
            .cloned())
    }

    async fn upsert(&self, rsvp: &EventRsvp) -> Result<(), InfraError> {
        let mut rsvps = self.rsvps.lock().unwrap();
        rsvps.retain(|r| !(r.event_id == rsvp.event_id && r.user_id == rsvp.user_id));
        rsvps.push(rsvp.clone());
        Ok(())
    }

    async fn delete(&self, event_id: &EventId, user_id: &UserId) -> Result<(), InfraError> {
        self.rsvps
            .lock()
            .unwrap()
            .retain(|r| !(&r.event_id == event_id && &r.user_id == user_id));
        Ok(())
    }
}

// ===== MockRepresentationInvitationRepository =====

#[derive(Clone, Default)]
pub struct MockRepresentationInvitationRepository {
    invitations: Arc<Mutex<Vec<RepresentationInvitation>>>,
}

impl MockRepresentationInvitationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, invitation: RepresentationInvitation) {
        self.invitations.lock().unwrap().push(invitation);
    }

    pub fn invitations(&self) -> Vec<RepresentationInvitation> {
        self.invitations.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepresentationInvitationRepository for MockRepresentationInvitationRepository {
    async fn insert(&self, invitation: &RepresentationInvitation) -> Result<(), InfraError> {
        self.add(invitation.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &InvitationId,
    ) -> Result<Option<RepresentationInvitation>, InfraError> {
        Ok(self
            .invitations
            .lock()
            .unwrap()
            .iter()
            .find(|i| &i.id == id)
            .cloned())
    }

    async fn update_status(
        &self,
        invitation: &RepresentationInvitation,
    ) -> Result<bool, InfraError> {
        let mut invitations = self.invitations.lock().unwrap();
        let Some(stored) = invitations
            .iter_mut()
            .find(|i| i.id == invitation.id && i.status == InvitationStatus::Pending)
        else {
            return Ok(false);
        };
        stored.status = invitation.status;
        stored.responded_at = invitation.responded_at;
        Ok(true)
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, InfraError> {
        let mut invitations = self.invitations.lock().unwrap();
        let mut expired = 0;
        for invitation in invitations
            .iter_mut()
            .filter(|i| i.status == InvitationStatus::Pending)
        {
            if let Ok(updated) = invitation.clone().expire(now) {
                *invitation = updated;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

// ===== MockUserDirectory =====

#[derive(Clone, Default)]
pub struct MockUserDirectory {
    emails: Arc<Mutex<HashMap<UserId, Email>>>,
    fail:   bool,
}

impl MockUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 問い合わせが常に失敗するディレクトリ
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_email(self, user_id: UserId, email: Email) -> Self {
        self.emails.lock().unwrap().insert(user_id, email);
        self
    }
}

#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn find_email(&self, user_id: &UserId) -> Result<Option<Email>, InfraError> {
        if self.fail {
            return Err(InfraError::unexpected("auth admin unavailable"));
        }
        Ok(self.emails.lock().unwrap().get(user_id).cloned())
    }
}

// ===== MockEmailTransport =====

/// 送信したメッセージを記録する送信実装
#[derive(Clone)]
pub struct MockEmailTransport {
    provider:      &'static str,
    reject_status: Option<u16>,
    sent:          Arc<Mutex<Vec<EmailMessage>>>,
}

impl MockEmailTransport {
    pub fn new(provider: &'static str) -> Self {
        Self {
            provider,
            reject_status: None,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 常に指定ステータスで拒否する送信実装
    pub fn rejecting(provider: &'static str, status: u16) -> Self {
        Self {
            reject_status: Some(status),
            ..Self::new(provider)
        }
    }

    /// 送信に成功したメッセージ
    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailTransport for MockEmailTransport {
    fn provider(&self) -> &'static str {
        self.provider
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, NotificationError> {
        if let Some(status) = self.reject_status {
            return Err(NotificationError::ProviderRejected {
                provider: self.provider,
                status,
                message: "rejected by mock".to_string(),
            });
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(DeliveryReceipt {
            message_id: format!("{}-{}", self.provider, sent.len()),
            provider:   self.provider,
        })
    }
}
