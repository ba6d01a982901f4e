//! # メールテンプレート管理
//!
//! 管理画面のテンプレートエディタ向けに、DB テンプレートの一覧・保存と
//! ブロック列の編集・HTML 化、プレビューを提供する。
//!
//! ブロックの文字列はエスケープして埋め込む。`{{key}}` はエスケープの対象外なので
//! そのままプレースホルダーとして残り、送信時に置換される。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use vybbi_domain::{
    clock::Clock,
    email_template::{EmailBlock, EmailBlocks, EmailTemplate},
    notification::{NotificationPayload, NotificationType},
};
use vybbi_infra::repository::EmailTemplateRepository;
use vybbi_shared::{event_log::event, log_business_event};

use super::notification::{TemplateResolver, TemplateSource, placeholder};
use crate::error::ServiceError;

/// テンプレート保存の入力
///
/// `blocks` がある場合は `html_content` より優先して HTML を生成する。
#[derive(Debug, Clone, Deserialize)]
pub struct SaveEmailTemplateInput {
    #[serde(skip)]
    pub notification_type: String,
    pub subject:           String,
    #[serde(default)]
    pub html_content:      Option<String>,
    #[serde(default)]
    pub blocks:            Option<EmailBlocks>,
    #[serde(default = "default_active")]
    pub is_active:         bool,
}

fn default_active() -> bool {
    true
}

/// ブロック列への編集操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BlockOperation {
    Move { from: usize, to: usize },
    Remove { index: usize },
}

/// 編集後のブロック列と生成した HTML
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedTemplate {
    pub blocks: EmailBlocks,
    pub html:   String,
}

/// プレビュー結果
///
/// `unresolved` はデータに値がなく置換されずに残ったプレースホルダーのキー（重複なし、出現順）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplatePreview {
    pub subject:    String,
    pub html:       String,
    pub source:     TemplateSource,
    pub unresolved: Vec<String>,
}

pub struct EmailTemplateUseCase {
    templates: Arc<dyn EmailTemplateRepository>,
    resolver:  Arc<TemplateResolver>,
    clock:     Arc<dyn Clock>,
}

impl EmailTemplateUseCase {
    pub fn new(
        templates: Arc<dyn EmailTemplateRepository>,
        resolver: Arc<TemplateResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            templates,
            resolver,
            clock,
        }
    }

    /// 全テンプレート（無効なものも含む）
    pub async fn list(&self) -> Result<Vec<EmailTemplate>, ServiceError> {
        Ok(self.templates.find_all().await?)
    }

    /// テンプレートを作成または更新する
    #[tracing::instrument(skip_all, fields(notification_type = %input.notification_type))]
    pub async fn save(&self, input: SaveEmailTemplateInput) -> Result<EmailTemplate, ServiceError> {
        let html_content = match (input.blocks, input.html_content) {
            (Some(blocks), _) => render_blocks(&blocks)?,
            (None, Some(html)) => html,
            (None, None) => {
                return Err(ServiceError::Validation(
                    "html_content または blocks のいずれかが必要です".to_string(),
                ));
            }
        };

        let template = EmailTemplate::new(
            input.notification_type,
            input.subject,
            html_content,
            input.is_active,
            self.clock.now(),
        )?;
        self.templates.upsert(&template).await?;

        log_business_event!(
            event.category = event::category::EMAIL_TEMPLATE,
            event.action = event::action::EMAIL_TEMPLATE_SAVED,
            event.entity_type = event::entity_type::EMAIL_TEMPLATE,
            event.entity_id = %template.notification_type,
            event.result = event::result::SUCCESS,
            template.is_active = template.is_active,
            "メールテンプレートを保存"
        );

        Ok(template)
    }

    /// ブロック列に編集操作を順に適用し、HTML を生成する
    ///
    /// いずれかの操作が範囲外ならバリデーションエラー。
    pub fn compose(
        &self,
        mut blocks: EmailBlocks,
        operations: &[BlockOperation],
    ) -> Result<ComposedTemplate, ServiceError> {
        for operation in operations {
            match *operation {
                BlockOperation::Move { from, to } => blocks.move_block(from, to)?,
                BlockOperation::Remove { index } => {
                    blocks.remove(index)?;
                }
            }
        }

        let html = render_blocks(&blocks)?;
        Ok(ComposedTemplate { blocks, html })
    }

    /// サンプルデータ（または指定データ）でテンプレートをレンダリングする
    ///
    /// DB テンプレートは無効なものでもプレビューする。
    #[tracing::instrument(skip_all, fields(notification_type = %notification_type))]
    pub async fn preview(
        &self,
        notification_type: &str,
        data: Option<Value>,
    ) -> Result<TemplatePreview, ServiceError> {
        let data = data.unwrap_or_else(|| sample_data(notification_type));
        let payload = NotificationPayload::from_request(notification_type, data)?;

        let stored = self
            .templates
            .find_all()
            .await?
            .into_iter()
            .find(|t| t.notification_type == notification_type);

        let resolved = match stored {
            Some(template) => self.resolver.render_stored(&template, &payload),
            None => self.resolver.render_default(&payload)?,
        };

        let mut unresolved = placeholder::keys(&resolved.subject);
        unresolved.extend(placeholder::keys(&resolved.html));
        let mut seen = std::collections::HashSet::new();
        unresolved.retain(|key| seen.insert(key.clone()));

        Ok(TemplatePreview {
            subject: resolved.subject,
            html: resolved.html,
            source: resolved.source,
            unresolved,
        })
    }
}

/// ブロック列を HTML に変換する
pub fn render_blocks(blocks: &EmailBlocks) -> Result<String, ServiceError> {
    blocks
        .as_slice()
        .iter()
        .map(render_block)
        .collect::<Result<Vec<_>, _>>()
        .map(|parts| parts.join("\n"))
}

fn render_block(block: &EmailBlock) -> Result<String, ServiceError> {
    let esc = tera::escape_html;
    Ok(match block {
        EmailBlock::Heading { text } => format!(
            r#"<h1 style="font-size:22px;margin:0 0 16px;">{}</h1>"#,
            esc(text)
        ),
        EmailBlock::Text { text } => format!(r#"<p style="margin:0 0 12px;">{}</p>"#, esc(text)),
        EmailBlock::Button { label, url } => format!(
            r#"<p style="margin:24px 0;"><a href="{}" style="background-color:#7c3aed;color:#ffffff;padding:12px 24px;border-radius:8px;text-decoration:none;">{}</a></p>"#,
            esc(checked_url(url)?),
            esc(label)
        ),
        EmailBlock::Image { src, alt } => format!(
            r#"<img src="{}" alt="{}" style="max-width:100%;display:block;margin:0 0 16px;">"#,
            esc(checked_url(src)?),
            esc(alt)
        ),
        EmailBlock::Divider => {
            r#"<hr style="border:none;border-top:1px solid #e5e7eb;margin:24px 0;">"#.to_string()
        }
        EmailBlock::Spacer { height } => format!(r#"<div style="height:{height}px;"></div>"#),
    })
}

/// リンク先は http(s) か `{{siteUrl}}` で始まるもののみ許可する
fn checked_url(url: &str) -> Result<&str, ServiceError> {
    let url = url.trim();
    if ["https://", "http://", "{{siteUrl}}"]
        .iter()
        .any(|prefix| url.starts_with(prefix))
    {
        Ok(url)
    } else {
        Err(ServiceError::Validation(format!(
            "URL は http(s) で始まる必要があります: {url}"
        )))
    }
}

/// プレビュー用のサンプルデータ
pub fn sample_data(notification_type: &str) -> Value {
    let Ok(notification_type) = notification_type.parse::<NotificationType>() else {
        return json!({
            "title": "Titre d'exemple",
            "message": "Ceci est un exemple de notification.",
        });
    };

    match notification_type {
        NotificationType::UserRegistration => json!({
            "userName": "Alice",
            "profileType": "artist",
        }),
        NotificationType::BookingRequest => json!({
            "artistName": "Nova",
            "venueName": "Le Trabendo",
            "eventDate": "2024-11-02",
            "message": "Disponible pour un set de 90 minutes ?",
        }),
        NotificationType::BookingStatusChanged => json!({
            "artistName": "Nova",
            "venueName": "Le Trabendo",
            "eventDate": "2024-11-02",
            "status": "accepted",
        }),
        NotificationType::MessageReceived => json!({
            "senderName": "Sam",
            "messagePreview": "Salut ! On se cale un appel ?",
        }),
        NotificationType::ReviewReceived => json!({
            "reviewerName": "Le Trabendo",
            "rating": 5,
            "comment": "Un set incroyable.",
        }),
        NotificationType::EventReminder => json!({
            "eventTitle": "Nuit Électro",
            "eventDate": "2024-11-02",
            "venueName": "Le Trabendo",
        }),
        NotificationType::RepresentationInvitation => json!({
            "inviterName": "Jade Agency",
            "inviterRole": "agent",
            "inviteeName": "Nova",
            "invitationId": "00000000-0000-0000-0000-000000000000",
        }),
        NotificationType::AffiliateConversion => json!({
            "influencerName": "Léa",
            "code": "LEA2024",
            "conversionType": "signup",
            "commission": "5 €",
        }),
    }
}
