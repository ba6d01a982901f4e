//! SMTP 送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用する。開発環境では Mailpit に接続する。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, header::ContentType},
};
use uuid::Uuid;
use vybbi_domain::notification::{
    DeliveryReceipt,
    EmailMessage,
    NotificationError,
    SenderIdentity,
};

use super::EmailTransport;

const PROVIDER: &str = "smtp";

/// SMTP 送信
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender:    SenderIdentity,
}

impl SmtpTransport {
    /// # 引数
    ///
    /// - `host`: SMTP サーバーのホスト名（例: "localhost"）
    /// - `port`: SMTP サーバーのポート番号（例: 1025 for Mailpit）
    pub fn new(host: &str, port: u16, sender: SenderIdentity) -> Self {
        // builder_dangerous: TLS なしで接続（Mailpit 等のローカル SMTP 向け）
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();

        Self { transport, sender }
    }

    fn build_message(&self, email: &EmailMessage, message_id: &str) -> Result<Message, NotificationError> {
        let mut builder = Message::builder()
            .message_id(Some(message_id.to_string()))
            .from(parse_mailbox("送信元", &self.sender.mailbox())?)
            .to(parse_mailbox("宛先", &email.to)?)
            .subject(&email.subject)
            .header(ContentType::TEXT_HTML);

        for cc in &email.cc {
            builder = builder.cc(parse_mailbox("cc", cc)?);
        }
        for bcc in &email.bcc {
            builder = builder.bcc(parse_mailbox("bcc", bcc)?);
        }
        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(parse_mailbox("reply-to", reply_to)?);
        }

        builder
            .body(email.html_body.clone())
            .map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))
    }
}

fn parse_mailbox(label: &str, address: &str) -> Result<Mailbox, NotificationError> {
    address
        .parse()
        .map_err(|e| NotificationError::SendFailed(format!("{label}アドレス不正 ({address}): {e}")))
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn send(&self, email: &EmailMessage) -> Result<DeliveryReceipt, NotificationError> {
        let domain = self
            .sender
            .address
            .split_once('@')
            .map_or("localhost", |(_, domain)| domain);
        let message_id = format!("<{}@{domain}>", Uuid::now_v7());
        let message = self.build_message(email, &message_id)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        Ok(DeliveryReceipt {
            message_id,
            provider: PROVIDER,
        })
    }
}
