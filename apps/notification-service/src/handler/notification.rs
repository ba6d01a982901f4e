//! # 通知ハンドラ
//!
//! 既存のフロントエンドから呼ばれる 3 つのエンドポイント。
//! レスポンス・エラーの JSON 形状は従来どおりで、Problem Details は使わない。
//!
//! ```text
//! POST /send-notification          → 200 {success, messageId}   / 400・500 {error, details}
//! POST /send-system-notification   → 200 {success, messageId}   / 500 {error, success: false}
//! POST /auto-notifications         → 200 {success, notification_id, email_sent, email_outcome}
//! ```
//!
//! いずれも `OPTIONS` には 200 を返し、その他のメソッドは 405。

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use vybbi_domain::{
    notification::{EmailOutcome, NotificationId},
    user::UserId,
};

use crate::{
    error::ServiceError,
    usecase::{DispatchInput, NotificationDispatcher, SendEmailInput},
};

/// 通知ハンドラの State
pub struct NotificationState {
    pub dispatcher: Arc<NotificationDispatcher>,
}

/// `POST /send-notification` のリクエストボディ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub to:                String,
    #[serde(default)]
    pub data:              Value,
    pub subject:           Option<String>,
    pub html:              Option<String>,
    pub html_content:      Option<String>,
    #[serde(default)]
    pub is_test:           bool,
}

/// `POST /send-system-notification` のリクエストボディ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendSystemNotificationRequest {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub to:                String,
    #[serde(default)]
    pub cc:                Vec<String>,
    #[serde(default)]
    pub bcc:               Vec<String>,
    pub reply_to:          Option<String>,
    #[serde(default)]
    pub data:              Value,
}

/// `POST /auto-notifications` のリクエストボディ
#[derive(Debug, Deserialize)]
pub struct AutoNotificationRequest {
    pub user_id:           UserId,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title:             String,
    pub message:           String,
    #[serde(default)]
    pub data:              Value,
    pub related_id:        Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentResponse {
    pub success:    bool,
    pub message_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AutoNotificationResponse {
    pub success:         bool,
    pub notification_id: NotificationId,
    pub email_sent:      bool,
    pub email_outcome:   EmailOutcome,
}

/// `{error, details}` 形式のエラー
#[derive(Debug, Serialize, Deserialize)]
pub struct LegacyError {
    pub error:   String,
    pub details: String,
}

/// `{error, success: false}` 形式のエラー
#[derive(Debug, Serialize, Deserialize)]
pub struct SystemError {
    pub error:   String,
    pub success: bool,
}

/// メールを送信する（DB テンプレート上書きあり）
///
/// `html` と `htmlContent` の両方がある場合は `html` を優先する。
pub async fn send_notification(
    State(state): State<Arc<NotificationState>>,
    body: Result<Json<SendNotificationRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return invalid_body(&rejection),
    };

    let input = SendEmailInput {
        to: req.to,
        notification_type: req.notification_type,
        data: req.data,
        subject: req.subject,
        html: req.html.or(req.html_content),
        is_test: req.is_test,
        ..SendEmailInput::default()
    };

    match state.dispatcher.send_email(input).await {
        Ok(receipt) => sent(receipt.message_id),
        Err(e) => legacy_error(e, "Failed to send notification"),
    }
}

/// システム通知を送信する（組み込みテンプレートのみ）
pub async fn send_system_notification(
    State(state): State<Arc<NotificationState>>,
    body: Result<Json<SendSystemNotificationRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return system_error(rejection.body_text()),
    };

    let input = SendEmailInput {
        to: req.to,
        cc: req.cc,
        bcc: req.bcc,
        reply_to: req.reply_to,
        notification_type: req.notification_type,
        data: req.data,
        system: true,
        ..SendEmailInput::default()
    };

    match state.dispatcher.send_email(input).await {
        Ok(receipt) => sent(receipt.message_id),
        Err(e) => {
            e.log();
            system_error(e.to_string())
        }
    }
}

/// 通知行を保存し、可能であればメールを送信する
///
/// メール送信の成否に関わらず、行の保存に成功すれば 200。
pub async fn auto_notification(
    State(state): State<Arc<NotificationState>>,
    body: Result<Json<AutoNotificationRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return invalid_body(&rejection),
    };

    let input = DispatchInput {
        user_id:           req.user_id,
        notification_type: req.notification_type,
        title:             req.title,
        message:           req.message,
        data:              req.data,
        related_id:        req.related_id,
    };

    match state.dispatcher.dispatch(input).await {
        Ok(report) => (
            StatusCode::OK,
            Json(AutoNotificationResponse {
                success:         true,
                email_sent:      report.email_sent(),
                notification_id: report.notification_id,
                email_outcome:   report.email_outcome,
            }),
        )
            .into_response(),
        Err(e) => legacy_error(e, "Failed to create notification"),
    }
}

/// CORS プリフライト
pub async fn preflight() -> &'static str {
    "ok"
}

fn sent(message_id: String) -> Response {
    (
        StatusCode::OK,
        Json(SentResponse {
            success: true,
            message_id,
        }),
    )
        .into_response()
}

fn invalid_body(rejection: &JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(LegacyError {
            error:   "Invalid request body".to_string(),
            details: rejection.body_text(),
        }),
    )
        .into_response()
}

fn legacy_error(e: ServiceError, error: &str) -> Response {
    e.log();
    let status = match &e {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(LegacyError {
            error:   error.to_string(),
            details: e.to_string(),
        }),
    )
        .into_response()
}

fn system_error(error: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(SystemError {
            error,
            success: false,
        }),
    )
        .into_response()
}
