//! # ユースケース層
//!
//! 通知サービスのビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・送信実装・時計を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは DTO 変換のみ行い、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `notification`: テンプレート解決と通知配信
//! - `affiliate`: アフィリエイトリンクの作成
//! - `rsvp`: イベント参加表明のトグル
//! - `invitation`: 代理人招待の作成と状態遷移
//! - `email_template`: メールテンプレートの管理とブロック編集

pub mod affiliate;
pub mod email_template;
pub mod invitation;
pub mod notification;
pub mod rsvp;

pub use affiliate::{CreateInfluencerLinkInput, InfluencerLinkUseCase};
pub use email_template::{
    BlockOperation,
    ComposedTemplate,
    EmailTemplateUseCase,
    SaveEmailTemplateInput,
    TemplatePreview,
};
pub use invitation::{CreateInvitationInput, InvitationCreated, InvitationUseCase};
pub use notification::{
    DispatchInput,
    DispatchReport,
    NotificationDispatcher,
    ResolveRequest,
    ResolvedEmail,
    SendEmailInput,
    TemplateResolver,
    TemplateSource,
};
pub use rsvp::{RsvpOutcome, RsvpUseCase};
