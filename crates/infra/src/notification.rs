//! # メール送信
//!
//! メール配信プロバイダとの通信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`EmailTransport`] でメール送信を抽象化
//! - **送信元はコンストラクタ注入**: 各実装は `SenderIdentity` を保持する
//! - **失敗は呼び出し元へ返す**: 非 2xx 応答は [`NotificationError::ProviderRejected`]
//! - **フォールバックは合成で表現**: [`FallbackTransport`] が 2 つの実装を束ねる
//!
//! | バックエンド | 実装 | 用途 |
//! |---|---|---|
//! | `resend` | [`ResendTransport`] | 本番（主プロバイダ） |
//! | `brevo` | [`BrevoTransport`] | 本番（副プロバイダ） |
//! | `smtp` | [`SmtpTransport`] | 開発（Mailpit） |
//! | `noop` | [`NoopTransport`] | テスト・送信無効化 |

mod brevo;
mod fallback;
mod noop;
mod resend;
mod smtp;

use async_trait::async_trait;
pub use brevo::BrevoTransport;
pub use fallback::FallbackTransport;
pub use noop::NoopTransport;
pub use resend::ResendTransport;
pub use smtp::SmtpTransport;
use vybbi_domain::notification::{DeliveryReceipt, EmailMessage, NotificationError};

/// メール送信トレイト
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// バックエンド名（ログと受領情報に使う）
    fn provider(&self) -> &'static str;

    /// メールを 1 通送信する
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, NotificationError>;
}

/// 送信バックエンドの種別
///
/// 環境変数 `EMAIL_BACKEND` / `EMAIL_FALLBACK_BACKEND` の値。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum EmailBackend {
    Resend,
    Brevo,
    Smtp,
    Noop,
}

/// 非 2xx 応答を [`NotificationError::ProviderRejected`] に変換する
///
/// 本文が JSON で `message` フィールドを持つ場合はその値を、
/// それ以外は本文テキストをそのままメッセージとする。
pub(crate) async fn rejected(
    provider: &'static str,
    response: reqwest::Response,
) -> NotificationError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    NotificationError::ProviderRejected {
        provider,
        status,
        message: extract_error_message(&body),
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
