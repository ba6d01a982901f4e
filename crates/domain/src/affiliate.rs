//! # アフィリエイトリンク
//!
//! インフルエンサーが発行する紹介リンクと、その識別コード。
//!
//! コードは利用者が入力するか、自動生成する。一意性は DB の UNIQUE 制約で
//! 担保し、重複時のメッセージ変換はユースケース層が行う。

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{DomainError, user::UserId};

define_uuid_id! {
    /// インフルエンサーリンク ID
    pub struct InfluencerLinkId as "インフルエンサーリンク";
}

/// 自動生成コードに使う文字（紛らわしい 0/O/1/I を除く）
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const GENERATED_CODE_LENGTH: usize = 8;
const MIN_CODE_LENGTH: usize = 3;
const MAX_CODE_LENGTH: usize = 32;

/// アフィリエイトコード（値オブジェクト）
///
/// 大文字英数字とハイフンのみ。入力は大文字に正規化する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AffiliateCode(String);

impl AffiliateCode {
    /// 利用者が入力したコードを検証して作成する
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_uppercase();
        let length = value.chars().count();

        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&length) {
            return Err(DomainError::Validation(format!(
                "コードは {MIN_CODE_LENGTH} 〜 {MAX_CODE_LENGTH} 文字である必要があります"
            )));
        }

        if !value
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(DomainError::Validation(
                "コードに使用できるのは英数字とハイフンのみです".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// ランダムなコードを生成する
    pub fn generate(rng: &mut impl Rng) -> Self {
        let code = (0..GENERATED_CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AffiliateCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// インフルエンサーのアフィリエイトリンク
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfluencerLink {
    pub id: InfluencerLinkId,
    pub influencer_id: UserId,
    pub code: AffiliateCode,
    pub target_url: String,
    pub campaign: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InfluencerLink {
    pub fn new(
        influencer_id: UserId,
        code: AffiliateCode,
        target_url: impl Into<String>,
        campaign: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let target_url = target_url.into().trim().to_string();
        if !(target_url.starts_with("https://") || target_url.starts_with("http://")) {
            return Err(DomainError::Validation(
                "リンク先 URL は http(s):// で始まる必要があります".to_string(),
            ));
        }

        Ok(Self {
            id: InfluencerLinkId::new(),
            influencer_id,
            code,
            target_url,
            campaign: campaign
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            created_at: now,
        })
    }

    /// 共有用 URL（`{site_url}/r/{code}`）
    pub fn share_url(&self, site_url: &str) -> String {
        format!("{}/r/{}", site_url.trim_end_matches('/'), self.code)
    }
}
