//! Brevo 送信実装
//!
//! `POST {base_url}/v3/smtp/email` に JSON を送る。認証は `api-key` ヘッダー。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vybbi_domain::notification::{
    DeliveryReceipt,
    EmailMessage,
    NotificationError,
    SenderIdentity,
};

use super::{EmailTransport, rejected};

const PROVIDER: &str = "brevo";

/// Brevo 送信
pub struct BrevoTransport {
    client:   reqwest::Client,
    base_url: String,
    api_key:  String,
    sender:   SenderIdentity,
}

impl BrevoTransport {
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
struct Contact<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name:  Option<&'a str>,
}

impl<'a> Contact<'a> {
    fn email(email: &'a str) -> Self {
        Self { email, name: None }
    }
}

fn contacts(addresses: &[String]) -> Vec<Contact<'_>> {
    addresses.iter().map(|a| Contact::email(a)).collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender:       Contact<'a>,
    to:           Vec<Contact<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc:           Vec<Contact<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bcc:          Vec<Contact<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to:     Option<Contact<'a>>,
    subject:      &'a str,
    html_content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailResponse {
    message_id: String,
}

#[async_trait]
impl EmailTransport for BrevoTransport {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    #[tracing::instrument(skip_all, fields(provider = PROVIDER), level = "debug")]
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, NotificationError> {
        let body = SendEmailRequest {
            sender:       Contact {
                email: &self.sender.address,
                name:  Some(&self.sender.name),
            },
            to:           vec![Contact::email(&message.to)],
            cc:           contacts(&message.cc),
            bcc:          contacts(&message.bcc),
            reply_to:     message.reply_to.as_deref().map(Contact::email),
            subject:      &message.subject,
            html_content: &message.html_body,
        };

        let response = self
            .client
            .post(format!("{}/v3/smtp/email", self.base_url))
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(format!("Brevo への接続に失敗: {e}")))?;

        if !response.status().is_success() {
            return Err(rejected(PROVIDER, response).await);
        }

        let sent: SendEmailResponse = response.json().await.map_err(|e| {
            NotificationError::SendFailed(format!("Brevo の応答を解釈できません: {e}"))
        })?;

        Ok(DeliveryReceipt {
            message_id: sent.message_id,
            provider:   PROVIDER,
        })
    }
}
