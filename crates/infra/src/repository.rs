//! # リポジトリ実装
//!
//! 各テーブルの永続化を担当するリポジトリトレイトと PostgreSQL 実装。
//!
//! - **トレイト経由**: ユースケースはトレイトオブジェクトに依存し、テストではモックに差し替える
//! - **行構造体 + `TryFrom`**: DB の行からドメイン型への変換を一箇所に集約する

pub mod email_template_repository;
pub mod event_rsvp_repository;
pub mod influencer_link_repository;
pub mod notification_preference_repository;
pub mod notification_repository;
pub mod representation_invitation_repository;

pub use email_template_repository::{EmailTemplateRepository, PostgresEmailTemplateRepository};
pub use event_rsvp_repository::{EventRsvpRepository, PostgresEventRsvpRepository};
pub use influencer_link_repository::{InfluencerLinkRepository, PostgresInfluencerLinkRepository};
pub use notification_preference_repository::{
    NotificationPreferenceRepository,
    PostgresNotificationPreferenceRepository,
};
pub use notification_repository::{NotificationRepository, PostgresNotificationRepository};
pub use representation_invitation_repository::{
    PostgresRepresentationInvitationRepository,
    RepresentationInvitationRepository,
};
