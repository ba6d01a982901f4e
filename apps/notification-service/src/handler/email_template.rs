//! # メールテンプレートハンドラ
//!
//! ```text
//! GET  /email-templates                  → 200 {data: [template]}
//! PUT  /email-templates/{type}           → 200 {data: template}
//! POST /email-templates/{type}/preview   → 200 {data: {subject, html, source, unresolved}}
//! POST /email-templates/compose          → 200 {data: {blocks, html}}
//! ```

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;
use vybbi_domain::email_template::EmailBlocks;
use vybbi_shared::ApiResponse;

use crate::{
    error::ServiceError,
    usecase::{BlockOperation, EmailTemplateUseCase, SaveEmailTemplateInput},
};

pub struct EmailTemplateState {
    pub usecase: EmailTemplateUseCase,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    /// 未指定ならサンプルデータを使う
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ComposeRequest {
    pub blocks:     EmailBlocks,
    #[serde(default)]
    pub operations: Vec<BlockOperation>,
}

pub async fn list_email_templates(
    State(state): State<Arc<EmailTemplateState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let templates = state.usecase.list().await?;
    Ok((StatusCode::OK, Json(ApiResponse::new(templates))))
}

/// テンプレートを作成または更新する（`is_active` で有効 / 無効を切り替える）
pub async fn save_email_template(
    State(state): State<Arc<EmailTemplateState>>,
    Path(notification_type): Path<String>,
    Json(mut input): Json<SaveEmailTemplateInput>,
) -> Result<impl IntoResponse, ServiceError> {
    input.notification_type = notification_type;
    let template = state.usecase.save(input).await?;
    Ok((StatusCode::OK, Json(ApiResponse::new(template))))
}

pub async fn preview_email_template(
    State(state): State<Arc<EmailTemplateState>>,
    Path(notification_type): Path<String>,
    body: Option<Json<PreviewRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    let data = body.and_then(|Json(req)| req.data);
    let preview = state.usecase.preview(&notification_type, data).await?;
    Ok((StatusCode::OK, Json(ApiResponse::new(preview))))
}

pub async fn compose_email_template(
    State(state): State<Arc<EmailTemplateState>>,
    Json(req): Json<ComposeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let composed = state.usecase.compose(req.blocks, &req.operations)?;
    Ok((StatusCode::OK, Json(ApiResponse::new(composed))))
}
