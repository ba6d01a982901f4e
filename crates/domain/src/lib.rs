//! # Vybbi ドメイン層
//!
//! 通知・メール配信と、それを起動するユーザー操作（アフィリエイトリンク、
//! イベント参加表明、代理人招待）のドメインモデルを定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! notification-service → infra → domain
//!          ↘                ↘
//!            shared ←─────────
//! ```
//!
//! ドメイン層は DB や外部 API に一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`notification`] - 通知種別、型付きペイロード、配信結果、メールメッセージ
//! - [`email_template`] - DB 上のテンプレート上書きとブロック編集
//! - [`affiliate`] - インフルエンサーのアフィリエイトリンク
//! - [`event`] - イベント参加表明（RSVP）
//! - [`representation`] - エージェント / マネージャーからの代理人招待
//! - [`user`] - ユーザー ID とメールアドレス
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメインエラー
//!
//! ## 使用例
//!
//! ```rust
//! use vybbi_domain::notification::{NotificationPayload, NotificationType};
//!
//! let payload = NotificationPayload::from_request(
//!     "user_registration",
//!     serde_json::json!({ "userName": "Alice", "profileType": "artist" }),
//! )
//! .unwrap();
//! assert_eq!(payload.notification_type(), Some(NotificationType::UserRegistration));
//! ```

#[macro_use]
mod macros;

pub mod affiliate;
pub mod clock;
pub mod email_template;
pub mod error;
pub mod event;
pub mod notification;
pub mod representation;
pub mod user;

pub use error::DomainError;
