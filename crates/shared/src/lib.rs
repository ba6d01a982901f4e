//! # Vybbi 共有ユーティリティ
//!
//! ドメイン層・インフラ層・通知サービスから共通で使う型とヘルパー。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum には依存しない（`IntoResponse` 変換はサービス側の責務）
//! - トレーシング初期化は `observability` フィーチャーでのみ有効

pub mod error_response;
pub mod event_log;
pub mod observability;
pub mod response;

pub use error_response::ErrorResponse;
pub use response::{ApiResponse, HealthResponse, HealthStatus};
