//! # アフィリエイトリンク作成
//!
//! インフルエンサーのアフィリエイトリンクを作成する。
//!
//! コードは入力値を大文字に正規化して使い、未指定なら自動生成する。
//! コードの一意性は DB の UNIQUE 制約に任せ、違反（SQLSTATE 23505）は
//! [`ServiceError::DuplicateCode`]、それ以外の保存失敗は
//! [`ServiceError::LinkCreationFailed`] に変換する。

use std::sync::Arc;

use vybbi_domain::{
    affiliate::{AffiliateCode, InfluencerLink},
    clock::Clock,
    user::UserId,
};
use vybbi_infra::repository::InfluencerLinkRepository;
use vybbi_shared::{event_log::event, log_business_event};

use crate::error::ServiceError;

/// リンク作成の入力
#[derive(Debug, Clone)]
pub struct CreateInfluencerLinkInput {
    pub influencer_id: UserId,
    pub target_url:    String,
    /// 未指定なら自動生成する
    pub code:          Option<String>,
    pub campaign:      Option<String>,
}

pub struct InfluencerLinkUseCase {
    links: Arc<dyn InfluencerLinkRepository>,
    clock: Arc<dyn Clock>,
}

impl InfluencerLinkUseCase {
    pub fn new(links: Arc<dyn InfluencerLinkRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { links, clock }
    }

    /// アフィリエイトリンクを作成する
    #[tracing::instrument(skip_all, fields(influencer_id = %input.influencer_id))]
    pub async fn create_link(
        &self,
        input: CreateInfluencerLinkInput,
    ) -> Result<InfluencerLink, ServiceError> {
        let code = match input.code.filter(|c| !c.trim().is_empty()) {
            Some(code) => AffiliateCode::new(code)?,
            None => AffiliateCode::generate(&mut rand::rng()),
        };

        let link = InfluencerLink::new(
            input.influencer_id,
            code,
            input.target_url,
            input.campaign,
            self.clock.now(),
        )?;

        self.links.insert(&link).await.map_err(|e| {
            if e.is_unique_violation() {
                tracing::info!(code = %link.code, "アフィリエイトコードが既に使われている");
                ServiceError::DuplicateCode
            } else {
                ServiceError::LinkCreationFailed(e)
            }
        })?;

        log_business_event!(
            event.category = event::category::AFFILIATE,
            event.action = event::action::AFFILIATE_LINK_CREATED,
            event.entity_type = event::entity_type::INFLUENCER_LINK,
            event.entity_id = %link.id,
            event.actor_id = %link.influencer_id,
            event.result = event::result::SUCCESS,
            affiliate.code = %link.code,
            "アフィリエイトリンクを作成"
        );

        Ok(link)
    }
}
