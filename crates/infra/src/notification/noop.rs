//! Noop 送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。

use async_trait::async_trait;
use uuid::Uuid;
use vybbi_domain::notification::{DeliveryReceipt, EmailMessage, NotificationError};

use super::EmailTransport;

const PROVIDER: &str = "noop";

/// Noop 送信（ログ出力のみ）
#[derive(Debug, Clone, Default)]
pub struct NoopTransport;

#[async_trait]
impl EmailTransport for NoopTransport {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn send(&self, email: &EmailMessage) -> Result<DeliveryReceipt, NotificationError> {
        let message_id = format!("noop-{}", Uuid::now_v7());
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            message_id = %message_id,
            "Noop: メール送信をスキップ"
        );

        Ok(DeliveryReceipt {
            message_id,
            provider: PROVIDER,
        })
    }
}
