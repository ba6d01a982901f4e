//! # メールテンプレート
//!
//! 組み込みテンプレートを上書きする DB 上のテンプレートと、
//! テンプレートエディタで組み立てるブロック列を定義する。
//!
//! ブロック列は順序付きリストで、並べ替え・削除・追加のみを行う。
//! HTML への変換はサービス層（エスケープ付きレンダラー）が担当する。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// DB 上のメールテンプレート
///
/// `is_active = false` の行は存在しないものとして扱われ、組み込みテンプレートが使われる。
/// `subject` / `html_content` には `{{key}}` 形式のプレースホルダーを含められる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub notification_type: String,
    pub subject: String,
    pub html_content: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl EmailTemplate {
    /// テンプレートを作成する
    ///
    /// 件名・本文が空の場合はバリデーションエラー。
    pub fn new(
        notification_type: impl Into<String>,
        subject: impl Into<String>,
        html_content: impl Into<String>,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let notification_type = notification_type.into().trim().to_string();
        let subject = subject.into();
        let html_content = html_content.into();

        if notification_type.is_empty() {
            return Err(DomainError::Validation(
                "テンプレートの種別は必須です".to_string(),
            ));
        }
        if subject.trim().is_empty() {
            return Err(DomainError::Validation("件名は必須です".to_string()));
        }
        if html_content.trim().is_empty() {
            return Err(DomainError::Validation("本文は必須です".to_string()));
        }

        Ok(Self {
            notification_type,
            subject,
            html_content,
            is_active,
            updated_at: now,
        })
    }
}

/// テンプレートエディタのブロック
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmailBlock {
    Heading { text: String },
    Text { text: String },
    Button { label: String, url: String },
    Image { src: String, alt: String },
    Divider,
    Spacer { height: u16 },
}

/// 順序付きブロック列
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailBlocks(Vec<EmailBlock>);

impl EmailBlocks {
    pub fn new(blocks: Vec<EmailBlock>) -> Self {
        Self(blocks)
    }

    pub fn as_slice(&self) -> &[EmailBlock] {
        &self.0
    }

    /// `from` のブロックを取り出して `to` の位置に挿入する
    pub fn move_block(&mut self, from: usize, to: usize) -> Result<(), DomainError> {
        let len = self.0.len();
        if from >= len || to >= len {
            return Err(DomainError::Validation(format!(
                "ブロック位置が範囲外です: from={from}, to={to}, len={len}"
            )));
        }

        let block = self.0.remove(from);
        self.0.insert(to, block);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<EmailBlock, DomainError> {
        if index >= self.0.len() {
            return Err(DomainError::Validation(format!(
                "ブロック位置が範囲外です: {index}"
            )));
        }
        Ok(self.0.remove(index))
    }
}
