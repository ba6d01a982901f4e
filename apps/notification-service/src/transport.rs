//! # 送信バックエンドの組み立て
//!
//! `EMAIL_BACKEND` / `EMAIL_FALLBACK_BACKEND` の設定から [`EmailTransport`] を構築する。
//! 副バックエンドが設定されている場合は [`FallbackTransport`] で包む。

use std::sync::Arc;

use vybbi_domain::notification::NotificationError;
use vybbi_infra::notification::{
    BrevoTransport,
    EmailBackend,
    EmailTransport,
    FallbackTransport,
    NoopTransport,
    ResendTransport,
    SmtpTransport,
};

use crate::config::EmailConfig;

/// 設定から送信バックエンドを構築する
///
/// API キーが必要なバックエンドでキーが未設定の場合は
/// [`NotificationError::Configuration`] を返す。
pub fn build_transport(
    config: &EmailConfig,
    client: reqwest::Client,
) -> Result<Arc<dyn EmailTransport>, NotificationError> {
    let primary = build_backend(config.backend, config, client.clone())?;

    let transport = match config.fallback_backend {
        Some(fallback) if fallback != config.backend => {
            let secondary = build_backend(fallback, config, client)?;
            Arc::new(FallbackTransport::new(primary, secondary)) as Arc<dyn EmailTransport>
        }
        _ => primary,
    };

    tracing::info!(
        backend = %config.backend,
        fallback = ?config.fallback_backend,
        "メール送信バックエンドを構築"
    );
    Ok(transport)
}

fn build_backend(
    backend: EmailBackend,
    config: &EmailConfig,
    client: reqwest::Client,
) -> Result<Arc<dyn EmailTransport>, NotificationError> {
    let sender = config.sender.clone();

    Ok(match backend {
        EmailBackend::Resend => Arc::new(ResendTransport::new(
            client,
            &config.resend_base_url,
            api_key(backend, config.resend_api_key.as_deref(), "RESEND_API_KEY")?,
            sender,
        )),
        EmailBackend::Brevo => Arc::new(BrevoTransport::new(
            client,
            &config.brevo_base_url,
            api_key(backend, config.brevo_api_key.as_deref(), "BREVO_API_KEY")?,
            sender,
        )),
        EmailBackend::Smtp => Arc::new(SmtpTransport::new(
            &config.smtp_host,
            config.smtp_port,
            sender,
        )),
        EmailBackend::Noop => Arc::new(NoopTransport),
    })
}

fn api_key<'a>(
    backend: EmailBackend,
    key: Option<&'a str>,
    name: &str,
) -> Result<&'a str, NotificationError> {
    key.ok_or_else(|| {
        NotificationError::Configuration(format!(
            "{backend} バックエンドには {name} が必要です"
        ))
    })
}
