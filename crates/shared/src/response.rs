//! # レスポンス本文
//!
//! 通知サービスの JSON レスポンス本文のうち、エラー以外のもの。
//!
//! - [`ApiResponse`] - トリガーポイント系エンドポイントの `{ "data": T }` 形式
//! - [`HealthResponse`] - `GET /health`
//!
//! 通知系 3 エンドポイントは既存クライアントとの互換のため独自形式を返すので、
//! ここでは扱わない。エラーは [`crate::ErrorResponse`] を参照。

use serde::{Deserialize, Serialize};

/// `{ "data": T }` で包んだ成功レスポンス
///
/// ```
/// use vybbi_shared::ApiResponse;
///
/// let body = serde_json::to_value(ApiResponse::new(3)).unwrap();
/// assert_eq!(body, serde_json::json!({ "data": 3 }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    /// 中身を取り出す
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T> From<T> for ApiResponse<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

/// 稼働状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
}

/// `GET /health` の本文
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status:  HealthStatus,
    pub version: &'static str,
}

impl HealthResponse {
    /// 起動済みのプロセスとして応答する
    ///
    /// `version` には呼び出し側クレートの `CARGO_PKG_VERSION` を渡す。
    pub fn healthy(version: &'static str) -> Self {
        Self {
            status: HealthStatus::Healthy,
            version,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_成功レスポンスはdataキーの下に入る() {
        let body = serde_json::to_value(ApiResponse::from(json!({ "expired": 3 }))).unwrap();
        assert_eq!(body, json!({ "data": { "expired": 3 } }));
    }

    #[test]
    fn test_成功レスポンスを読み戻せる() {
        let response: ApiResponse<Vec<String>> =
            serde_json::from_str(r#"{"data": ["attending"]}"#).unwrap();
        assert_eq!(response.into_data(), vec!["attending"]);
    }

    #[test]
    fn test_ヘルスチェックの本文() {
        let body = serde_json::to_value(HealthResponse::healthy("1.2.0")).unwrap();
        assert_eq!(body, json!({ "status": "healthy", "version": "1.2.0" }));
    }
}
