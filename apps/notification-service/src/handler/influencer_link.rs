//! # アフィリエイトリンクハンドラ
//!
//! ```text
//! POST /influencer-links → 201 {data: link} / 409 重複コード / 500 保存失敗
//! ```

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use vybbi_domain::user::UserId;
use vybbi_shared::ApiResponse;

use crate::{
    error::ServiceError,
    usecase::{CreateInfluencerLinkInput, InfluencerLinkUseCase},
};

pub struct InfluencerLinkState {
    pub usecase: InfluencerLinkUseCase,
}

#[derive(Debug, Deserialize)]
pub struct CreateInfluencerLinkRequest {
    pub influencer_id: UserId,
    pub target_url:    String,
    pub code:          Option<String>,
    pub campaign:      Option<String>,
}

/// アフィリエイトリンクを作成する
pub async fn create_influencer_link(
    State(state): State<Arc<InfluencerLinkState>>,
    Json(req): Json<CreateInfluencerLinkRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let link = state
        .usecase
        .create_link(CreateInfluencerLinkInput {
            influencer_id: req.influencer_id,
            target_url:    req.target_url,
            code:          req.code,
            campaign:      req.campaign,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(link))))
}
