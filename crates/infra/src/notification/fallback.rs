//! フォールバック送信
//!
//! 主バックエンドで失敗したときに副バックエンドで再送する。
//! 両方失敗した場合は両方のエラーを含むエラーを返す。

use std::sync::Arc;

use async_trait::async_trait;
use vybbi_domain::notification::{DeliveryReceipt, EmailMessage, NotificationError};

use super::EmailTransport;

/// 主 → 副の順に送信を試みる
pub struct FallbackTransport {
    primary:   Arc<dyn EmailTransport>,
    secondary: Arc<dyn EmailTransport>,
}

impl FallbackTransport {
    pub fn new(primary: Arc<dyn EmailTransport>, secondary: Arc<dyn EmailTransport>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl EmailTransport for FallbackTransport {
    fn provider(&self) -> &'static str {
        self.primary.provider()
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, NotificationError> {
        let primary_error = match self.primary.send(message).await {
            Ok(receipt) => return Ok(receipt),
            Err(e) => e,
        };

        tracing::warn!(
            primary = self.primary.provider(),
            secondary = self.secondary.provider(),
            error = %primary_error,
            "主バックエンドで送信に失敗したため副バックエンドで再送"
        );

        self.secondary.send(message).await.map_err(|secondary_error| {
            NotificationError::SendFailed(format!(
                "{}: {primary_error} / {}: {secondary_error}",
                self.primary.provider(),
                self.secondary.provider(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mock::MockEmailTransport;

    fn message() -> EmailMessage {
        EmailMessage::simple("alice@example.com", "Bienvenue", "<p>Bonjour</p>")
    }

    #[tokio::test]
    async fn test_主バックエンドが成功すれば副は呼ばれない() {
        let primary = MockEmailTransport::new("resend");
        let secondary = MockEmailTransport::new("brevo");
        let transport =
            FallbackTransport::new(Arc::new(primary.clone()), Arc::new(secondary.clone()));

        let receipt = transport.send(&message()).await.unwrap();

        assert_eq!(receipt.provider, "resend");
        assert_eq!(primary.sent_messages().len(), 1);
        assert!(secondary.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_主バックエンドが失敗すると副で送信する() {
        let primary = MockEmailTransport::rejecting("resend", 503);
        let secondary = MockEmailTransport::new("brevo");
        let transport = FallbackTransport::new(Arc::new(primary), Arc::new(secondary.clone()));

        let receipt = transport.send(&message()).await.unwrap();

        assert_eq!(receipt.provider, "brevo");
        assert_eq!(secondary.sent_messages(), vec![message()]);
    }

    #[tokio::test]
    async fn test_両方失敗するとエラーを返す() {
        let transport = FallbackTransport::new(
            Arc::new(MockEmailTransport::rejecting("resend", 503)),
            Arc::new(MockEmailTransport::rejecting("brevo", 401)),
        );

        let err = transport.send(&message()).await.unwrap_err();

        let text = err.to_string();
        assert!(text.contains("503"), "{text}");
        assert!(text.contains("401"), "{text}");
    }
}
