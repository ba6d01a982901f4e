//! # ドメインエラー
//!
//! ユースケース層で `ServiceError` に変換され、次のステータスになる。
//!
//! - `Validation`: 400（通知データの必須キー欠落、アフィリエイトコードの文字種など）
//! - `NotFound`: 404（招待が存在しない）
//! - `Conflict`: 409（応答済みの招待への再応答）

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 例: 通知データに必須フィールドがない、アフィリエイトコードの文字種が不正
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"RepresentationInvitation" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 状態遷移の競合
    ///
    /// `pending` 以外の招待を承諾しようとした場合など。
    #[error("競合が発生しました: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_見つからない対象の種別とidを表示する() {
        let error = DomainError::NotFound {
            entity_type: "RepresentationInvitation",
            id:          "inv-1".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "RepresentationInvitation が見つかりません: inv-1"
        );
    }
}
