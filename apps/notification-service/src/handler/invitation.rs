//! # 代理人招待ハンドラ
//!
//! ```text
//! POST /representation-invitations              → 201 {data: {invitation, email_outcome?}}
//! POST /representation-invitations/{id}/accept  → 200 / 404 / 409
//! POST /representation-invitations/{id}/decline → 200 / 404 / 409
//! POST /representation-invitations/{id}/cancel  → 200 / 404 / 409
//! POST /representation-invitations/expire       → 200 {data: {expired}}
//! ```

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use vybbi_domain::{
    representation::{InvitationId, RepresentationRole},
    user::UserId,
};
use vybbi_shared::ApiResponse;

use crate::{
    error::ServiceError,
    usecase::{CreateInvitationInput, InvitationUseCase},
};

pub struct InvitationState {
    pub usecase: InvitationUseCase,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub inviter_id:    UserId,
    pub inviter_name:  String,
    pub inviter_role:  RepresentationRole,
    pub artist_id:     Option<UserId>,
    pub invitee_email: Option<String>,
    pub invitee_name:  Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpiredResponse {
    pub expired: u64,
}

/// 招待を作成する
pub async fn create_invitation(
    State(state): State<Arc<InvitationState>>,
    Json(req): Json<CreateInvitationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .usecase
        .create(CreateInvitationInput {
            inviter_id:    req.inviter_id,
            inviter_name:  req.inviter_name,
            inviter_role:  req.inviter_role,
            artist_id:     req.artist_id,
            invitee_email: req.invitee_email,
            invitee_name:  req.invitee_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(created))))
}

pub async fn accept_invitation(
    State(state): State<Arc<InvitationState>>,
    Path(id): Path<InvitationId>,
) -> Result<impl IntoResponse, ServiceError> {
    let invitation = state.usecase.accept(&id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::new(invitation))))
}

pub async fn decline_invitation(
    State(state): State<Arc<InvitationState>>,
    Path(id): Path<InvitationId>,
) -> Result<impl IntoResponse, ServiceError> {
    let invitation = state.usecase.decline(&id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::new(invitation))))
}

pub async fn cancel_invitation(
    State(state): State<Arc<InvitationState>>,
    Path(id): Path<InvitationId>,
) -> Result<impl IntoResponse, ServiceError> {
    let invitation = state.usecase.cancel(&id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::new(invitation))))
}

/// 期限切れの招待を一括で `expired` にする
pub async fn expire_invitations(
    State(state): State<Arc<InvitationState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let expired = state.usecase.expire_stale().await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(ExpiredResponse { expired })),
    ))
}
