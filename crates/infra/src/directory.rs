//! # ユーザーディレクトリ
//!
//! 認証プロバイダの管理 API からユーザーのメールアドレスを取得する。
//!
//! `GET {base_url}/admin/users/{id}` をサービスロールキーで呼び出す。
//! ユーザーが存在しない（404）、またはメールアドレスが未登録・不正な場合は `None`。

use async_trait::async_trait;
use serde::Deserialize;
use vybbi_domain::user::{Email, UserId};

use crate::error::InfraError;

/// ユーザーディレクトリトレイト
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// ユーザーのメールアドレスを取得する
    async fn find_email(&self, user_id: &UserId) -> Result<Option<Email>, InfraError>;
}

/// 認証プロバイダの管理 API 実装
pub struct AuthAdminUserDirectory {
    client:      reqwest::Client,
    base_url:    String,
    service_key: String,
}

impl AuthAdminUserDirectory {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AdminUser {
    #[serde(default)]
    email: Option<String>,
}

#[async_trait]
impl UserDirectory for AuthAdminUserDirectory {
    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user_id))]
    async fn find_email(&self, user_id: &UserId) -> Result<Option<Email>, InfraError> {
        let response = self
            .client
            .get(format!("{}/admin/users/{user_id}", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let user: AdminUser = response.error_for_status()?.json().await?;

        let Some(raw) = user.email.filter(|e| !e.trim().is_empty()) else {
            return Ok(None);
        };

        match Email::new(raw) {
            Ok(email) => Ok(Some(email)),
            Err(e) => {
                tracing::warn!(error = %e, "登録済みメールアドレスの形式が不正なため送信対象外");
                Ok(None)
            }
        }
    }
}
