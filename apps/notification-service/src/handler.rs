//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ロジックはユースケース層に委譲
//! - 通知系 3 エンドポイントは従来の JSON 形状、それ以外は Problem Details

pub mod email_template;
pub mod health;
pub mod influencer_link;
pub mod invitation;
pub mod notification;
pub mod rsvp;

pub use email_template::{
    EmailTemplateState,
    compose_email_template,
    list_email_templates,
    preview_email_template,
    save_email_template,
};
pub use health::health_check;
pub use influencer_link::{InfluencerLinkState, create_influencer_link};
pub use invitation::{
    InvitationState,
    accept_invitation,
    cancel_invitation,
    create_invitation,
    decline_invitation,
    expire_invitations,
};
pub use notification::{
    NotificationState,
    auto_notification,
    preflight,
    send_notification,
    send_system_notification,
};
pub use rsvp::{RsvpState, toggle_rsvp};
