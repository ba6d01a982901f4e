//! # イベント参加表明ハンドラ
//!
//! ```text
//! POST /events/{event_id}/rsvp → 200 {data: {outcome: "set" | "removed", status?}}
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
    event::{EventId, RsvpStatus},
    user::UserId,
};
use vybbi_shared::ApiResponse;

use crate::{
    error::ServiceError,
    usecase::{RsvpOutcome, RsvpUseCase},
};

pub struct RsvpState {
    pub usecase: RsvpUseCase,
}

#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    pub user_id: UserId,
    pub status:  RsvpStatus,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RsvpResponse {
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status:  Option<RsvpStatus>,
}

impl From<RsvpOutcome> for RsvpResponse {
    fn from(outcome: RsvpOutcome) -> Self {
        match outcome {
            RsvpOutcome::Removed => Self {
                outcome: "removed".to_string(),
                status:  None,
            },
            RsvpOutcome::Set(rsvp) => Self {
                outcome: "set".to_string(),
                status:  Some(rsvp.status),
            },
        }
    }
}

/// 参加表明をトグルする
pub async fn toggle_rsvp(
    State(state): State<Arc<RsvpState>>,
    Path(event_id): Path<EventId>,
    Json(req): Json<RsvpRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state
        .usecase
        .toggle(event_id, req.user_id, req.status)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(RsvpResponse::from(outcome))),
    ))
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, Request},
        routing::post,
    };
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;
    use vybbi_domain::clock::FixedClock;
    use vybbi_infra::mock::MockEventRsvpRepository;

    use super::*;

    fn create_test_app(rsvps: MockEventRsvpRepository) -> Router {
        let usecase = RsvpUseCase::new(
            Arc::new(rsvps),
            Arc::new(FixedClock::new(
                DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            )),
        );
        Router::new()
            .route("/events/{event_id}/rsvp", post(toggle_rsvp))
            .with_state(Arc::new(RsvpState { usecase }))
    }

    fn request(event_id: &EventId, user_id: &UserId, status: &str) -> Request<Body> {
        let body = serde_json::json!({ "user_id": user_id.to_string(), "status": status });
        Request::builder()
            .method(Method::POST)
            .uri(format!("/events/{event_id}/rsvp"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_body(response: axum::response::Response) -> ApiResponse<RsvpResponse> {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_attendingを2回送ると取り消される() {
        // Given
        let rsvps = MockEventRsvpRepository::new();
        let sut = create_test_app(rsvps.clone());
        let (event_id, user_id) = (EventId::new(), UserId::new());

        // When
        let first = sut
            .clone()
            .oneshot(request(&event_id, &user_id, "attending"))
            .await
            .unwrap();
        let second = sut
            .oneshot(request(&event_id, &user_id, "attending"))
            .await
            .unwrap();

        // Then
        assert_eq!(
            response_body(first).await.data,
            RsvpResponse {
                outcome: "set".to_string(),
                status:  Some(RsvpStatus::Attending),
            }
        );
        assert_eq!(
            response_body(second).await.data,
            RsvpResponse {
                outcome: "removed".to_string(),
                status:  None,
            }
        );
        assert!(rsvps.rsvps().is_empty());
    }

    #[tokio::test]
    async fn test_不正なステータスは4xx() {
        let sut = create_test_app(MockEventRsvpRepository::new());

        let response = sut
            .oneshot(request(&EventId::new(), &UserId::new(), "maybe"))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
