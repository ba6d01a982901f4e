//! # テンプレートリゾルバー
//!
//! 通知種別とデータから、メールの件名と HTML 本文を決定する。
//!
//! ## 解決順序
//!
//! 1. 呼び出し元が指定した件名 / 本文（指定された部分のみ）
//! 2. DB 上の有効なテンプレート（システム通知では参照しない）
//! 3. 組み込みテンプレート（件名はコード内、本文は `templates/notifications/<type>.html`）
//! 4. 未知の種別は汎用フォールバック（データの JSON ダンプ）
//!
//! どの経路でも置換は [`placeholder::substitute`] のみを使う。
//! 組み込みテンプレートとフォールバックは tera のレイアウトで包む。

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tera::{Context, Tera};
use vybbi_domain::{
    email_template::EmailTemplate,
    notification::{NotificationError, NotificationPayload, NotificationType},
};
use vybbi_infra::repository::EmailTemplateRepository;
use vybbi_shared::event_log::error;

use super::placeholder::{self, Target};

const LAYOUT: &str = "layout.html";

/// 件名 / 本文の出どころ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TemplateSource {
    /// 呼び出し元の指定
    Literal,
    /// DB 上のテンプレート
    Stored,
    /// 組み込みテンプレート
    BuiltIn,
    /// 未知の種別向けの汎用フォールバック
    Fallback,
}

/// 解決済みの件名と本文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEmail {
    pub subject: String,
    pub html:    String,
    pub source:  TemplateSource,
}

/// 解決リクエスト
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub payload:      &'a NotificationPayload,
    /// 呼び出し元指定の件名
    pub subject:      Option<&'a str>,
    /// 呼び出し元指定の HTML 本文
    pub html:         Option<&'a str>,
    /// 件名に `[TEST] ` を付ける
    pub is_test:      bool,
    /// DB テンプレートを参照するか
    pub allow_stored: bool,
}

impl<'a> ResolveRequest<'a> {
    /// 指定なし・DB テンプレート参照ありのリクエスト
    pub fn new(payload: &'a NotificationPayload) -> Self {
        Self {
            payload,
            subject: None,
            html: None,
            is_test: false,
            allow_stored: true,
        }
    }

    /// 組み込みテンプレートのみを使うリクエスト（システム通知）
    pub fn built_in_only(payload: &'a NotificationPayload) -> Self {
        Self {
            allow_stored: false,
            ..Self::new(payload)
        }
    }
}

/// テンプレートリゾルバー
pub struct TemplateResolver {
    engine:    Tera,
    templates: Arc<dyn EmailTemplateRepository>,
    site_url:  String,
}

impl TemplateResolver {
    /// `include_str!` で埋め込んだレイアウトを tera に登録する
    pub fn new(
        templates: Arc<dyn EmailTemplateRepository>,
        site_url: impl Into<String>,
    ) -> Result<Self, NotificationError> {
        let mut engine = Tera::default();
        engine
            .add_raw_template(
                LAYOUT,
                include_str!("../../../../../templates/notifications/layout.html"),
            )
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self {
            engine,
            templates,
            site_url: site_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// 件名と本文を解決する
    #[tracing::instrument(skip_all, level = "debug", fields(notification_type = %request.payload.type_name()))]
    pub async fn resolve(
        &self,
        request: ResolveRequest<'_>,
    ) -> Result<ResolvedEmail, NotificationError> {
        let context = self.context(request.payload);

        let mut resolved = match (request.subject, request.html) {
            (Some(subject), Some(html)) => ResolvedEmail {
                subject: placeholder::substitute(subject, &context, Target::Text),
                html:    placeholder::substitute(html, &context, Target::Html),
                source:  TemplateSource::Literal,
            },
            (subject, html) => {
                let mut base = self
                    .resolve_template(request.payload, &context, request.allow_stored)
                    .await?;
                if let Some(subject) = subject {
                    base.subject = placeholder::substitute(subject, &context, Target::Text);
                    base.source = TemplateSource::Literal;
                }
                if let Some(html) = html {
                    base.html = placeholder::substitute(html, &context, Target::Html);
                    base.source = TemplateSource::Literal;
                }
                base
            }
        };

        if request.is_test {
            resolved.subject = format!("[TEST] {}", resolved.subject);
        }

        let source: &'static str = resolved.source.into();
        tracing::debug!(source, "テンプレートを解決");
        Ok(resolved)
    }

    /// DB 上のテンプレートを有効 / 無効に関わらずレンダリングする（プレビュー用）
    pub fn render_stored(
        &self,
        template: &EmailTemplate,
        payload: &NotificationPayload,
    ) -> ResolvedEmail {
        Self::substitute_stored(template, &self.context(payload))
    }

    /// 組み込みテンプレート、未知の種別なら汎用フォールバックでレンダリングする
    pub fn render_default(
        &self,
        payload: &NotificationPayload,
    ) -> Result<ResolvedEmail, NotificationError> {
        self.render_default_with(payload, &self.context(payload))
    }

    async fn resolve_template(
        &self,
        payload: &NotificationPayload,
        context: &Map<String, Value>,
        allow_stored: bool,
    ) -> Result<ResolvedEmail, NotificationError> {
        if allow_stored {
            let stored = self
                .templates
                .find_active(&payload.type_name())
                .await
                .map_err(|e| {
                    tracing::error!(
                        error.category = error::category::INFRASTRUCTURE,
                        error.kind = error::kind::TEMPLATE,
                        "メールテンプレートの取得に失敗: {}",
                        e
                    );
                    NotificationError::TemplateFailed(format!("テンプレートの取得に失敗: {e}"))
                })?;

            if let Some(template) = stored {
                return Ok(Self::substitute_stored(&template, context));
            }
        }

        self.render_default_with(payload, context)
    }

    fn render_default_with(
        &self,
        payload: &NotificationPayload,
        context: &Map<String, Value>,
    ) -> Result<ResolvedEmail, NotificationError> {
        match payload.notification_type() {
            Some(notification_type) => self.render_built_in(notification_type, context),
            None => self.render_fallback(&payload.type_name(), &payload.raw_data()),
        }
    }

    fn substitute_stored(template: &EmailTemplate, context: &Map<String, Value>) -> ResolvedEmail {
        ResolvedEmail {
            subject: placeholder::substitute(&template.subject, context, Target::Text),
            html:    placeholder::substitute(&template.html_content, context, Target::Html),
            source:  TemplateSource::Stored,
        }
    }

    fn render_built_in(
        &self,
        notification_type: NotificationType,
        context: &Map<String, Value>,
    ) -> Result<ResolvedEmail, NotificationError> {
        let subject =
            placeholder::substitute(built_in_subject(notification_type), context, Target::Text);
        let body = placeholder::substitute(built_in_body(notification_type), context, Target::Html);

        Ok(ResolvedEmail {
            html: self.wrap(&subject, &body)?,
            subject,
            source: TemplateSource::BuiltIn,
        })
    }

    fn render_fallback(
        &self,
        type_name: &str,
        data: &Value,
    ) -> Result<ResolvedEmail, NotificationError> {
        let dump = serde_json::to_string_pretty(data)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;
        let subject = format!("Notification Vybbi : {type_name}");
        let body = format!(
            "<h1 style=\"font-size:22px;margin:0 0 16px;\">Notification Vybbi</h1>\n<p>Type : \
             <strong>{}</strong></p>\n<pre style=\"white-space:pre-wrap;background-color:#f3f4f6;\
             padding:12px;border-radius:8px;\">{}</pre>",
            tera::escape_html(type_name),
            tera::escape_html(&dump),
        );

        Ok(ResolvedEmail {
            html: self.wrap(&subject, &body)?,
            subject,
            source: TemplateSource::Fallback,
        })
    }

    /// 本文を共通レイアウトで包む
    fn wrap(&self, subject: &str, body: &str) -> Result<String, NotificationError> {
        let mut context = Context::new();
        context.insert("subject", subject);
        context.insert("content", body);
        context.insert("site_url", &self.site_url);

        self.engine
            .render(LAYOUT, &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))
    }

    fn context(&self, payload: &NotificationPayload) -> Map<String, Value> {
        let mut context = payload.context();
        context.insert("siteUrl".to_string(), Value::String(self.site_url.clone()));
        context
    }
}

/// 組み込みテンプレートの件名
fn built_in_subject(notification_type: NotificationType) -> &'static str {
    match notification_type {
        NotificationType::UserRegistration => "Bienvenue sur Vybbi, {{userName}} !",
        NotificationType::BookingRequest => "Nouvelle demande de booking de {{venueName}}",
        NotificationType::BookingStatusChanged => "Votre booking du {{eventDate}} : {{status}}",
        NotificationType::MessageReceived => "Nouveau message de {{senderName}}",
        NotificationType::ReviewReceived => "Nouvel avis de {{reviewerName}}",
        NotificationType::EventReminder => "Rappel : {{eventTitle}} le {{eventDate}}",
        NotificationType::RepresentationInvitation => {
            "{{inviterName}} vous invite à rejoindre Vybbi"
        }
        NotificationType::AffiliateConversion => "Nouvelle conversion avec votre code {{code}}",
    }
}

/// 組み込みテンプレートの本文
fn built_in_body(notification_type: NotificationType) -> &'static str {
    match notification_type {
        NotificationType::UserRegistration => {
            include_str!("../../../../../templates/notifications/user_registration.html")
        }
        NotificationType::BookingRequest => {
            include_str!("../../../../../templates/notifications/booking_request.html")
        }
        NotificationType::BookingStatusChanged => {
            include_str!("../../../../../templates/notifications/booking_status_changed.html")
        }
        NotificationType::MessageReceived => {
            include_str!("../../../../../templates/notifications/message_received.html")
        }
        NotificationType::ReviewReceived => {
            include_str!("../../../../../templates/notifications/review_received.html")
        }
        NotificationType::EventReminder => {
            include_str!("../../../../../templates/notifications/event_reminder.html")
        }
        NotificationType::RepresentationInvitation => {
            include_str!("../../../../../templates/notifications/representation_invitation.html")
        }
        NotificationType::AffiliateConversion => {
            include_str!("../../../../../templates/notifications/affiliate_conversion.html")
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use vybbi_infra::mock::MockEmailTemplateRepository;

    use super::*;

    fn resolver_with(templates: MockEmailTemplateRepository) -> TemplateResolver {
        TemplateResolver::new(Arc::new(templates), "https://vybbi.app/").unwrap()
    }

    fn resolver() -> TemplateResolver {
        resolver_with(MockEmailTemplateRepository::new())
    }

    fn payload(type_name: &str, data: Value) -> NotificationPayload {
        NotificationPayload::from_request(type_name, data).unwrap()
    }

    async fn stored_template(
        repo: &MockEmailTemplateRepository,
        subject: &str,
        html: &str,
        is_active: bool,
    ) {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let template =
            EmailTemplate::new("user_registration", subject, html, is_active, now).unwrap();
        repo.upsert(&template).await.unwrap();
    }

    #[tokio::test]
    async fn test_user_registrationの組み込みテンプレート() {
        let payload = payload(
            "user_registration",
            json!({ "userName": "Alice", "profileType": "artist" }),
        );

        let resolved = resolver()
            .resolve(ResolveRequest::new(&payload))
            .await
            .unwrap();

        assert_eq!(resolved.source, TemplateSource::BuiltIn);
        assert!(resolved.subject.contains("Alice"));
        assert!(resolved.html.contains("artist"));
        assert!(!resolved.html.contains("{{userName}}"));
        assert!(resolved.html.contains("vybbi.app/profile/edit"));
    }

    #[rstest]
    #[case("user_registration", json!({ "userName": "Alice", "profileType": "artist" }))]
    #[case("booking_request", json!({ "artistName": "Nova", "venueName": "Le Trabendo", "eventDate": "2024-11-02" }))]
    #[case("booking_status_changed", json!({ "artistName": "Nova", "venueName": "Le Trabendo", "eventDate": "2024-11-02", "status": "confirmed" }))]
    #[case("message_received", json!({ "senderName": "Sam", "messagePreview": "Salut !" }))]
    #[case("review_received", json!({ "reviewerName": "Sam", "rating": 5 }))]
    #[case("event_reminder", json!({ "eventTitle": "Nuit électro", "eventDate": "2024-11-02" }))]
    #[case("representation_invitation", json!({ "inviterName": "Jo", "inviterRole": "agent" }))]
    #[case("affiliate_conversion", json!({ "influencerName": "Lou", "code": "SUMMER24", "conversionType": "signup" }))]
    #[tokio::test]
    async fn test_全組み込み種別でプレースホルダーが残らない(
        #[case] type_name: &str,
        #[case] data: Value,
    ) {
        let payload = payload(type_name, data);

        let resolved = resolver()
            .resolve(ResolveRequest::new(&payload))
            .await
            .unwrap();

        assert!(!resolved.subject.trim().is_empty());
        assert!(!resolved.html.trim().is_empty());
        assert!(!resolved.subject.contains("{{"), "{}", resolved.subject);
        assert!(!resolved.html.contains("{{"), "{}", resolved.html);
    }

    #[tokio::test]
    async fn test_未知の種別は汎用フォールバックになる() {
        let payload = payload("campaign_digest", json!({ "count": 3, "title": "<b>Top</b>" }));

        let resolved = resolver()
            .resolve(ResolveRequest::new(&payload))
            .await
            .unwrap();

        assert_eq!(resolved.source, TemplateSource::Fallback);
        assert_eq!(resolved.subject, "Notification Vybbi : campaign_digest");
        assert!(resolved.html.contains("<pre"));
        assert!(resolved.html.contains("&quot;count&quot;: 3"));
        assert!(!resolved.html.contains("<b>Top</b>"));
    }

    #[tokio::test]
    async fn test_差し込み値はhtmlエスケープされる() {
        let payload = payload(
            "message_received",
            json!({ "senderName": "Eve", "messagePreview": "<script>alert('x')</script>" }),
        );

        let resolved = resolver()
            .resolve(ResolveRequest::new(&payload))
            .await
            .unwrap();

        assert!(!resolved.html.contains("<script>"));
        assert!(resolved.html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_呼び出し元指定の件名と本文が優先される() {
        let payload = payload(
            "user_registration",
            json!({ "userName": "Alice", "profileType": "artist" }),
        );
        let request = ResolveRequest {
            subject: Some("Salut {{userName}}"),
            html: Some("<p>{{ profileType }}</p>"),
            ..ResolveRequest::new(&payload)
        };

        let resolved = resolver().resolve(request).await.unwrap();

        assert_eq!(
            resolved,
            ResolvedEmail {
                subject: "Salut Alice".to_string(),
                html:    "<p>artist</p>".to_string(),
                source:  TemplateSource::Literal,
            }
        );
    }

    #[tokio::test]
    async fn test_件名のみ指定した場合は本文を組み込みテンプレートから補う() {
        let payload = payload(
            "user_registration",
            json!({ "userName": "Alice", "profileType": "artist" }),
        );
        let request = ResolveRequest {
            subject: Some("Salut {{userName}}"),
            ..ResolveRequest::new(&payload)
        };

        let resolved = resolver().resolve(request).await.unwrap();

        assert_eq!(resolved.subject, "Salut Alice");
        assert!(resolved.html.contains("Bienvenue sur Vybbi"));
    }

    #[tokio::test]
    async fn test_テスト送信は件名に接頭辞が付く() {
        let payload = payload(
            "user_registration",
            json!({ "userName": "Alice", "profileType": "artist" }),
        );
        let request = ResolveRequest {
            is_test: true,
            ..ResolveRequest::new(&payload)
        };

        let resolved = resolver().resolve(request).await.unwrap();

        assert_eq!(resolved.subject, "[TEST] Bienvenue sur Vybbi, Alice !");
    }

    #[tokio::test]
    async fn test_有効なdbテンプレートが組み込みより優先される() {
        let repo = MockEmailTemplateRepository::new();
        stored_template(&repo, "Coucou {{userName}}", "<p>{{profileType}}</p>", true).await;
        let payload = payload(
            "user_registration",
            json!({ "userName": "Alice", "profileType": "venue" }),
        );

        let resolved = resolver_with(repo)
            .resolve(ResolveRequest::new(&payload))
            .await
            .unwrap();

        assert_eq!(resolved.source, TemplateSource::Stored);
        assert_eq!(resolved.subject, "Coucou Alice");
        assert_eq!(resolved.html, "<p>venue</p>");
    }

    #[tokio::test]
    async fn test_無効なdbテンプレートは無視される() {
        let repo = MockEmailTemplateRepository::new();
        stored_template(&repo, "Coucou {{userName}}", "<p>x</p>", false).await;
        let payload = payload(
            "user_registration",
            json!({ "userName": "Alice", "profileType": "venue" }),
        );

        let resolved = resolver_with(repo)
            .resolve(ResolveRequest::new(&payload))
            .await
            .unwrap();

        assert_eq!(resolved.source, TemplateSource::BuiltIn);
    }

    #[tokio::test]
    async fn test_システム通知はdbテンプレートを参照しない() {
        let repo = MockEmailTemplateRepository::new();
        stored_template(&repo, "Coucou {{userName}}", "<p>x</p>", true).await;
        let payload = payload(
            "user_registration",
            json!({ "userName": "Alice", "profileType": "venue" }),
        );

        let resolved = resolver_with(repo)
            .resolve(ResolveRequest::built_in_only(&payload))
            .await
            .unwrap();

        assert_eq!(resolved.source, TemplateSource::BuiltIn);
    }
}
