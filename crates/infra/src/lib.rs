//! # Vybbi インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とマイグレーション
//! - **リポジトリ実装**: 通知行、受信設定、テンプレート、トリガーポイントの永続化
//! - **メール送信**: Resend / Brevo / SMTP / Noop と、フォールバック合成
//! - **ユーザーディレクトリ**: 認証プロバイダの管理 API からのメールアドレス取得
//!
//! ## 依存関係
//!
//! ```text
//! notification-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層に依存しない。
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use vybbi_infra::{db, repository::PostgresNotificationRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/vybbi", db::PoolSettings::default()).await?;
//!     db::run_migrations(&pool).await?;
//!     let notifications = PostgresNotificationRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod directory;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
