//! # ユーザー
//!
//! ユーザーの実体（プロフィール、認証情報）は外部のマネージドバックエンドが
//! 所有する。このモジュールは通知経路で必要な識別子とメールアドレスのみを扱う。

use serde::{Deserialize, Serialize};

use crate::DomainError;

define_uuid_id! {
    /// ユーザー ID
    ///
    /// 認証プロバイダが発行する UUID。アーティスト、会場、エージェント、
    /// マネージャー、インフルエンサーのいずれのプロフィールにも共通。
    pub struct UserId as "ユーザー";
}

/// メールアドレス（値オブジェクト）
///
/// 送信先・cc・bcc・reply-to に使う。生成時に形式を検証する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 前後の空白は除去する
    /// - `local@domain` の形式で、どちらも空でない
    /// - ドメインに `.` を含む
    /// - 最大 254 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        if value.chars().count() > 254 {
            return Err(DomainError::Validation(
                "メールアドレスは 254 文字以内である必要があります".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(format!(
                "メールアドレスの形式が不正です: {value}"
            )));
        };

        if local.is_empty()
            || domain.is_empty()
            || !domain.contains('.')
            || domain.contains('@')
            || value.contains(char::is_whitespace)
        {
            return Err(DomainError::Validation(format!(
                "メールアドレスの形式が不正です: {value}"
            )));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
