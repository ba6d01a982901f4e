//! # ルーター構築
//!
//! 全エンドポイントを 1 つの [`Router`] にまとめ、CORS とリクエストトレースを付与する。

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handler::{
    EmailTemplateState,
    InfluencerLinkState,
    InvitationState,
    NotificationState,
    RsvpState,
    accept_invitation,
    auto_notification,
    cancel_invitation,
    compose_email_template,
    create_influencer_link,
    create_invitation,
    decline_invitation,
    expire_invitations,
    health_check,
    list_email_templates,
    preflight,
    preview_email_template,
    save_email_template,
    send_notification,
    send_system_notification,
    toggle_rsvp,
};

/// ハンドラごとの State
pub struct AppStates {
    pub notification:    Arc<NotificationState>,
    pub influencer_link: Arc<InfluencerLinkState>,
    pub rsvp:            Arc<RsvpState>,
    pub invitation:      Arc<InvitationState>,
    pub email_template:  Arc<EmailTemplateState>,
}

/// アプリケーションのルーターを構築する
pub fn router(states: AppStates) -> Router {
    let notification = Router::new()
        .route(
            "/send-notification",
            post(send_notification).options(preflight),
        )
        .route(
            "/send-system-notification",
            post(send_system_notification).options(preflight),
        )
        .route(
            "/auto-notifications",
            post(auto_notification).options(preflight),
        )
        .with_state(states.notification);

    let influencer_link = Router::new()
        .route("/influencer-links", post(create_influencer_link))
        .with_state(states.influencer_link);

    let rsvp = Router::new()
        .route("/events/{event_id}/rsvp", post(toggle_rsvp))
        .with_state(states.rsvp);

    let invitation = Router::new()
        .route("/representation-invitations", post(create_invitation))
        .route(
            "/representation-invitations/expire",
            post(expire_invitations),
        )
        .route(
            "/representation-invitations/{id}/accept",
            post(accept_invitation),
        )
        .route(
            "/representation-invitations/{id}/decline",
            post(decline_invitation),
        )
        .route(
            "/representation-invitations/{id}/cancel",
            post(cancel_invitation),
        )
        .with_state(states.invitation);

    let email_template = Router::new()
        .route("/email-templates", get(list_email_templates))
        .route("/email-templates/compose", post(compose_email_template))
        .route("/email-templates/{type}", put(save_email_template))
        .route(
            "/email-templates/{type}/preview",
            post(preview_email_template),
        )
        .with_state(states.email_template);

    Router::new()
        .route("/health", get(health_check))
        .merge(notification)
        .merge(influencer_link)
        .merge(rsvp)
        .merge(invitation)
        .merge(email_template)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

/// ブラウザから直接呼ばれるための CORS 設定
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}
