//! Resend 送信実装
//!
//! `POST {base_url}/emails` に JSON を送る。認証は Bearer トークン。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vybbi_domain::notification::{
    DeliveryReceipt,
    EmailMessage,
    NotificationError,
    SenderIdentity,
};

use super::{EmailTransport, rejected};

const PROVIDER: &str = "resend";

/// Resend 送信
pub struct ResendTransport {
    client:   reqwest::Client,
    base_url: String,
    api_key:  String,
    sender:   SenderIdentity,
}

impl ResendTransport {
    /// # 引数
    ///
    /// - `base_url`: API のベース URL（例: `https://api.resend.com`）
    /// - `api_key`: `RESEND_API_KEY`
    /// - `sender`: 送信元
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        sender: SenderIdentity,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            sender,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from:     String,
    to:       [&'a str; 1],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    cc:       &'a [String],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    bcc:      &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    subject:  &'a str,
    html:     &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[async_trait]
impl EmailTransport for ResendTransport {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    #[tracing::instrument(skip_all, fields(provider = PROVIDER), level = "debug")]
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, NotificationError> {
        let body = SendEmailRequest {
            from:     self.sender.mailbox(),
            to:       [message.to.as_str()],
            cc:       &message.cc,
            bcc:      &message.bcc,
            reply_to: message.reply_to.as_deref(),
            subject:  &message.subject,
            html:     &message.html_body,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(format!("Resend への接続に失敗: {e}")))?;

        if !response.status().is_success() {
            return Err(rejected(PROVIDER, response).await);
        }

        let sent: SendEmailResponse = response.json().await.map_err(|e| {
            NotificationError::SendFailed(format!("Resend の応答を解釈できません: {e}"))
        })?;

        Ok(DeliveryReceipt {
            message_id: sent.id,
            provider:   PROVIDER,
        })
    }
}
