//! # 通知サービス設定
//!
//! 環境変数から通知サービスの設定を読み込む。
//!
//! 必須変数が欠けている、または値が不正な場合は [`ConfigError`] を返す。
//! テストでは [`NotificationServiceConfig::from_lookup`] に任意の検索関数を渡す。

use std::{env, str::FromStr};

use thiserror::Error;
use vybbi_domain::notification::SenderIdentity;
use vybbi_infra::notification::EmailBackend;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// 通知サービスの設定
#[derive(Debug, Clone)]
pub struct NotificationServiceConfig {
    /// バインドアドレス
    pub host:               String,
    /// ポート番号
    pub port:               u16,
    /// データベース接続 URL
    pub database_url:       String,
    /// 接続プールの最大接続数
    pub db_max_connections: u32,
    /// フロントエンド URL（メール内リンク用）
    pub site_url:           String,
    pub email:              EmailConfig,
    pub auth:               AuthAdminConfig,
}

/// メール送信の設定
///
/// `EMAIL_BACKEND` で主バックエンドを、`EMAIL_FALLBACK_BACKEND` で副バックエンドを選ぶ。
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub backend:          EmailBackend,
    pub fallback_backend: Option<EmailBackend>,
    pub sender:           SenderIdentity,
    pub resend_api_key:   Option<String>,
    pub resend_base_url:  String,
    pub brevo_api_key:    Option<String>,
    pub brevo_base_url:   String,
    pub smtp_host:        String,
    pub smtp_port:        u16,
}

/// 認証プロバイダ管理 API の設定
#[derive(Debug, Clone)]
pub struct AuthAdminConfig {
    pub base_url:         String,
    pub service_role_key: String,
}

impl NotificationServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 検索関数から設定を読み込む
    ///
    /// 空文字列の値は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        Ok(Self {
            host:               vars.or("NOTIFICATION_HOST", "0.0.0.0"),
            port:               vars.parse_required("NOTIFICATION_PORT")?,
            database_url:       vars.required("DATABASE_URL")?,
            db_max_connections: vars.parse_or("DB_MAX_CONNECTIONS", 10)?,
            site_url:           vars
                .or("SITE_URL", "http://localhost:5173")
                .trim_end_matches('/')
                .to_string(),
            email:              EmailConfig {
                backend:          vars.parse_or("EMAIL_BACKEND", EmailBackend::Noop)?,
                fallback_backend: vars.parse_optional("EMAIL_FALLBACK_BACKEND")?,
                sender:           SenderIdentity::new(
                    vars.or("EMAIL_SENDER_NAME", "Vybbi"),
                    vars.or("EMAIL_SENDER_ADDRESS", "noreply@vybbi.app"),
                ),
                resend_api_key:   vars.optional("RESEND_API_KEY"),
                resend_base_url:  vars.or("RESEND_BASE_URL", "https://api.resend.com"),
                brevo_api_key:    vars.optional("BREVO_API_KEY"),
                brevo_base_url:   vars.or("BREVO_BASE_URL", "https://api.brevo.com"),
                smtp_host:        vars.or("SMTP_HOST", "localhost"),
                smtp_port:        vars.parse_or("SMTP_PORT", 1025)?,
            },
            auth:               AuthAdminConfig {
                base_url:         vars.required("AUTH_ADMIN_URL")?,
                service_role_key: vars.required("AUTH_SERVICE_ROLE_KEY")?,
            },
        })
    }
}

struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn optional(&self, name: &'static str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn or(&self, name: &'static str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn parse_optional<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, ConfigError> {
        self.optional(name)
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| ConfigError::Invalid { name, value })
            })
            .transpose()
    }

    fn parse_or<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        Ok(self.parse_optional(name)?.unwrap_or(default))
    }

    fn parse_required<T: FromStr>(&self, name: &'static str) -> Result<T, ConfigError> {
        self.parse_optional(name)?.ok_or(ConfigError::Missing(name))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<NotificationServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NotificationServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("NOTIFICATION_PORT", "3003"),
        ("DATABASE_URL", "postgres://localhost/vybbi"),
        ("AUTH_ADMIN_URL", "http://localhost:54321/auth/v1"),
        ("AUTH_SERVICE_ROLE_KEY", "service-role-key"),
    ];

    #[test]
    fn test_必須変数のみでデフォルト値が使われる() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3003);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.site_url, "http://localhost:5173");
        assert_eq!(config.email.backend, EmailBackend::Noop);
        assert_eq!(config.email.fallback_backend, None);
        assert_eq!(
            config.email.sender,
            SenderIdentity::new("Vybbi", "noreply@vybbi.app")
        );
        assert_eq!(config.email.resend_base_url, "https://api.resend.com");
        assert_eq!(config.email.smtp_port, 1025);
    }

    #[test]
    fn test_バックエンドとフォールバックを読み込める() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("EMAIL_BACKEND", "resend"),
            ("EMAIL_FALLBACK_BACKEND", "brevo"),
            ("RESEND_API_KEY", "re_123"),
            ("SITE_URL", "https://vybbi.app/"),
        ]);

        let config = load(&pairs).unwrap();

        assert_eq!(config.email.backend, EmailBackend::Resend);
        assert_eq!(config.email.fallback_backend, Some(EmailBackend::Brevo));
        assert_eq!(config.email.resend_api_key.as_deref(), Some("re_123"));
        assert_eq!(config.site_url, "https://vybbi.app");
    }

    #[test]
    fn test_必須変数が欠けるとエラー() {
        let pairs: Vec<_> = REQUIRED
            .into_iter()
            .filter(|(k, _)| *k != "DATABASE_URL")
            .collect();

        assert_eq!(
            load(&pairs).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
    }

    #[test]
    fn test_不正なバックエンド名はエラー() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("EMAIL_BACKEND", "ses"));

        assert_eq!(
            load(&pairs).unwrap_err(),
            ConfigError::Invalid {
                name:  "EMAIL_BACKEND",
                value: "ses".to_string(),
            }
        );
    }

    #[test]
    fn test_不正なポート番号はエラー() {
        let mut pairs: Vec<_> = REQUIRED
            .into_iter()
            .filter(|(k, _)| *k != "NOTIFICATION_PORT")
            .collect();
        pairs.push(("NOTIFICATION_PORT", "not-a-port"));

        assert!(matches!(
            load(&pairs),
            Err(ConfigError::Invalid {
                name: "NOTIFICATION_PORT",
                ..
            })
        ));
    }
}
