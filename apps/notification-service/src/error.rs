//! # 通知サービス エラー定義
//!
//! ユースケースが返すエラーと、RFC 9457 Problem Details への変換を定義する。
//!
//! 通知系 3 エンドポイントは従来の JSON 形状を維持するため、
//! [`IntoResponse`] ではなく各ハンドラで個別に変換する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use vybbi_domain::{DomainError, notification::NotificationError};
use vybbi_infra::{InfraError, InfraErrorKind};
use vybbi_shared::{ErrorResponse, event_log::error};

/// アフィリエイトコード重複時の利用者向けメッセージ
pub const DUPLICATE_CODE_MESSAGE: &str = "Ce code existe déjà. Veuillez en choisir un autre.";

/// アフィリエイトリンク作成失敗時の利用者向けメッセージ
pub const LINK_CREATION_FAILED_MESSAGE: &str =
    "Impossible de créer le lien d'affiliation. Veuillez réessayer.";

/// 通知サービスで発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    Validation(String),

    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 状態遷移の競合
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// アフィリエイトコードの一意制約違反
    #[error("アフィリエイトコードが重複しています")]
    DuplicateCode,

    /// アフィリエイトリンクの保存失敗（一意制約違反以外）
    #[error("アフィリエイトリンクの保存に失敗: {0}")]
    LinkCreationFailed(#[source] InfraError),

    /// メールの生成・送信失敗
    #[error(transparent)]
    Delivery(#[from] NotificationError),

    /// データベース・外部 API エラー
    #[error("インフラエラー: {0}")]
    Infra(#[from] InfraError),
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            not_found @ DomainError::NotFound { .. } => Self::NotFound(not_found.to_string()),
        }
    }
}

impl ServiceError {
    /// HTTP ステータスコード
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::DuplicateCode => StatusCode::CONFLICT,
            Self::LinkCreationFailed(_) | Self::Delivery(_) | Self::Infra(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 内部エラーを構造化ログに出力する
    ///
    /// 4xx 系は何もしない。
    pub fn log(&self) {
        match self {
            Self::LinkCreationFailed(e) | Self::Infra(e) => {
                let (category, kind) = match e.kind() {
                    InfraErrorKind::Http(_) => {
                        (error::category::EXTERNAL_SERVICE, error::kind::USER_LOOKUP)
                    }
                    _ => (error::category::INFRASTRUCTURE, error::kind::DATABASE),
                };
                tracing::error!(
                    error.category = category,
                    error.kind = kind,
                    span_trace = %e.span_trace(),
                    "インフラエラー: {}",
                    e
                );
            }
            Self::Delivery(e) => {
                tracing::error!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::EMAIL_DELIVERY,
                    "メール送信エラー: {}",
                    e
                );
            }
            Self::Validation(_) | Self::NotFound(_) | Self::Conflict(_) | Self::DuplicateCode => {}
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        self.log();

        let body = match &self {
            Self::Validation(msg) => ErrorResponse::validation_error(msg.clone()),
            Self::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
            Self::Conflict(msg) => ErrorResponse::conflict(msg.clone()),
            Self::DuplicateCode => ErrorResponse::new(
                "duplicate-code",
                "Duplicate Code",
                StatusCode::CONFLICT.as_u16(),
                DUPLICATE_CODE_MESSAGE,
            ),
            Self::LinkCreationFailed(_) => {
                ErrorResponse::internal_error_with(LINK_CREATION_FAILED_MESSAGE)
            }
            Self::Delivery(_) | Self::Infra(_) => ErrorResponse::internal_error(),
        };

        (self.status(), Json(body)).into_response()
    }
}
