//! # インフラ層エラー
//!
//! DB・メール API・認証プロバイダ API の失敗をまとめて表す。
//!
//! [`InfraError`] は種別 [`InfraErrorKind`] に加えて、生成時点の [`SpanTrace`] を持つ。
//! 生成経路（`From` 実装と `unique_violation` / `unexpected`）はすべて
//! その時点のスパンを記録する。

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// PostgreSQL の一意制約違反
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

/// インフラ層で発生するエラー
///
/// アフィリエイトコードの重複判定は [`is_unique_violation`](InfraError::is_unique_violation)、
/// それ以外の分岐は [`kind`](InfraError::kind) で行う。
#[derive(Debug, Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// データベースエラー（一意制約違反以外）
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// 一意制約違反（SQLSTATE 23505）
    ///
    /// ユースケース層で利用者向けのメッセージに変換する。
    #[error("一意制約違反: {}", constraint.as_deref().unwrap_or("unknown"))]
    UniqueViolation {
        /// 違反した制約名（取得できた場合）
        constraint: Option<String>,
    },

    /// 外部 HTTP API との通信エラー
    #[error("HTTP 通信エラー: {0}")]
    Http(#[source] reqwest::Error),

    /// シリアライズ/デシリアライズエラー
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// 予期しないエラー
    ///
    /// DB に保存された値がドメインの型に変換できない場合など。
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    fn from_kind(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self.kind, InfraErrorKind::UniqueViolation { .. })
    }

    pub fn unique_violation(constraint: Option<String>) -> Self {
        Self::from_kind(InfraErrorKind::UniqueViolation { constraint })
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::Unexpected(msg.into()))
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

impl From<sqlx::Error> for InfraError {
    /// SQLSTATE 23505 だけは [`InfraErrorKind::UniqueViolation`] に振り分ける
    fn from(source: sqlx::Error) -> Self {
        let violated = source
            .as_database_error()
            .filter(|db| db.code().as_deref() == Some(SQLSTATE_UNIQUE_VIOLATION))
            .map(|db| db.constraint().map(str::to_string));

        let kind = match violated {
            Some(constraint) => InfraErrorKind::UniqueViolation { constraint },
            None => InfraErrorKind::Database(source),
        };
        Self::from_kind(kind)
    }
}

impl From<reqwest::Error> for InfraError {
    fn from(source: reqwest::Error) -> Self {
        Self::from_kind(InfraErrorKind::Http(source))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self::from_kind(InfraErrorKind::Serialization(source))
    }
}
