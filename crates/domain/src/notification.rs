//! # 通知
//!
//! アプリ内通知とメール配信に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 |
//! |---|------------|
//! | [`Notification`] | 通知行（アプリ内通知として永続化される記録） |
//! | [`NotificationType`] | 組み込みテンプレートを持つ通知種別 |
//! | [`NotificationPayload`] | 通知種別ごとの型付きデータ（未知の種別も保持） |
//! | [`NotificationPreference`] | ユーザー × 通知種別のメール受信設定 |
//! | [`EmailOutcome`] | 1 回の配信要求に対するメール送信結果 |
//!
//! ## 設計方針
//!
//! - **明示的な配信結果**: 送信失敗を握りつぶさず、[`EmailOutcome`] として呼び出し元に返す
//! - **送信元はコンストラクタ注入**: [`SenderIdentity`] を設定から組み立てて各送信実装に渡す
//! - **テンプレート分離**: 件名・本文の生成はサービス層の TemplateResolver が担当する

mod payload;

use chrono::{DateTime, Utc};
pub use payload::*;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;
use uuid::Uuid;

use crate::user::UserId;

define_uuid_id! {
    /// 通知 ID
    ///
    /// notifications テーブルの主キー。
    pub struct NotificationId as "通知";
}

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール API が 2xx 以外を返した
    #[error("{provider} がメール送信を拒否しました (status {status}): {message}")]
    ProviderRejected {
        /// 送信バックエンド名（"resend" など）
        provider: &'static str,
        /// HTTP ステータスコード
        status:   u16,
        /// プロバイダのエラーメッセージ
        message:  String,
    },

    /// 送信そのものに失敗（接続エラー、SMTP エラーなど）
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),

    /// 送信バックエンドの設定不備
    #[error("通知設定が不正です: {0}")]
    Configuration(String),
}

impl NotificationError {
    /// プロバイダが返した HTTP ステータス（拒否以外は `None`）
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            Self::ProviderRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 組み込みテンプレートを持つ通知種別
///
/// notifications テーブルの `type` カラム、email_templates テーブルの
/// `type` カラム、各 HTTP エンドポイントの `type` フィールドに入る値。
/// snake_case でシリアライズされる。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationType {
    /// 新規登録の歓迎メール
    UserRegistration,
    /// 会場 / 主催者からのブッキング依頼 → アーティストへ
    BookingRequest,
    /// ブッキングの確定・キャンセル
    BookingStatusChanged,
    /// 新着メッセージ
    MessageReceived,
    /// レビュー投稿
    ReviewReceived,
    /// イベント前日のリマインド
    EventReminder,
    /// エージェント / マネージャーからの代理人招待
    RepresentationInvitation,
    /// アフィリエイトリンク経由のコンバージョン
    AffiliateConversion,
}

/// 通知行
///
/// 配信要求 1 回につき 1 行作成される。作成時は `email_sent = false` で、
/// メール送信成功時に一度だけ `email_sent = true` に更新される。削除はしない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    /// 通知種別（未知の種別もそのまま保存する）
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub related_id: Option<Uuid>,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 通知行の作成パラメータ
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub related_id: Option<Uuid>,
    pub now: DateTime<Utc>,
}

impl Notification {
    /// 未送信状態の通知行を作成する
    pub fn new(params: NewNotification) -> Self {
        Self {
            id: NotificationId::new(),
            user_id: params.user_id,
            notification_type: params.notification_type,
            title: params.title,
            message: params.message,
            data: params.data,
            related_id: params.related_id,
            email_sent: false,
            email_sent_at: None,
            created_at: params.now,
        }
    }

    /// メール送信済みにする
    pub fn mark_email_sent(self, now: DateTime<Utc>) -> Self {
        Self {
            email_sent: true,
            email_sent_at: Some(now),
            ..self
        }
    }
}

/// ユーザー × 通知種別のメール受信設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreference {
    pub user_id: UserId,
    pub notification_type: String,
    pub email_enabled: bool,
}

impl NotificationPreference {
    /// 設定行からメール送信可否を判定する
    ///
    /// 行が存在しない場合は送信可とする。明示的に `false` の場合のみ拒否。
    pub fn allows_email(preference: Option<&Self>) -> bool {
        preference.is_none_or(|p| p.email_enabled)
    }
}

/// 送信元（送信者名とアドレス）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    pub name:    String,
    pub address: String,
}

impl SenderIdentity {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name:    name.into(),
            address: address.into(),
        }
    }

    /// `From` ヘッダー形式（`Vybbi <noreply@vybbi.app>`）
    pub fn mailbox(&self) -> String {
        format!("{} <{}>", self.name, self.address)
    }
}

/// メールメッセージ
///
/// TemplateResolver の出力に宛先情報を加えたもの。EmailTransport に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to:        String,
    pub cc:        Vec<String>,
    pub bcc:       Vec<String>,
    pub reply_to:  Option<String>,
    pub subject:   String,
    pub html_body: String,
}

impl EmailMessage {
    /// cc / bcc / reply-to なしのメッセージを作る
    pub fn simple(
        to: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
    ) -> Self {
        Self {
            to:        to.into(),
            cc:        Vec::new(),
            bcc:       Vec::new(),
            reply_to:  None,
            subject:   subject.into(),
            html_body: html_body.into(),
        }
    }
}

/// 送信成功時の受領情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// プロバイダが採番したメッセージ ID
    pub message_id: String,
    /// 実際に送信したバックエンド
    pub provider:   &'static str,
}

/// メール送信を見送った理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// 認証プロバイダにメールアドレスが登録されていない
    NoRecipientEmail,
    /// ユーザーが通知種別のメール受信を無効化している
    OptedOut,
}

/// 1 回の配信要求に対するメール送信結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EmailOutcome {
    Sent { message_id: String },
    Skipped { reason: SkipReason },
    Failed { error: String },
}

impl EmailOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}
