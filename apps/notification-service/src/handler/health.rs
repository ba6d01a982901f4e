//! # ヘルスチェックハンドラ
//!
//! ```text
//! GET /health → 200 {"status": "healthy", "version": "0.1.0"}
//! ```

use axum::Json;
use vybbi_shared::HealthResponse;

/// ヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}
