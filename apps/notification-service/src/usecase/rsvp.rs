//! # イベント参加表明
//!
//! 同じステータスを再度選ぶと取り消し、別のステータスなら置き換える。

use std::sync::Arc;

use vybbi_domain::{
    clock::Clock,
    event::{EventId, EventRsvp, RsvpChange, RsvpStatus},
    user::UserId,
};
use vybbi_infra::repository::EventRsvpRepository;
use vybbi_shared::{event_log::event, log_business_event};

use crate::error::ServiceError;

/// トグル結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RsvpOutcome {
    /// 取り消した
    Removed,
    /// 作成または置き換えた
    Set(EventRsvp),
}

pub struct RsvpUseCase {
    rsvps: Arc<dyn EventRsvpRepository>,
    clock: Arc<dyn Clock>,
}

impl RsvpUseCase {
    pub fn new(rsvps: Arc<dyn EventRsvpRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { rsvps, clock }
    }

    #[tracing::instrument(skip_all, fields(event_id = %event_id, user_id = %user_id))]
    pub async fn toggle(
        &self,
        event_id: EventId,
        user_id: UserId,
        status: RsvpStatus,
    ) -> Result<RsvpOutcome, ServiceError> {
        let current = self.rsvps.find(&event_id, &user_id).await?;

        match EventRsvp::toggle(
            current.as_ref(),
            event_id.clone(),
            user_id.clone(),
            status,
            self.clock.now(),
        ) {
            RsvpChange::Remove => {
                self.rsvps.delete(&event_id, &user_id).await?;
                log_business_event!(
                    event.category = event::category::EVENT,
                    event.action = event::action::RSVP_REMOVED,
                    event.entity_type = event::entity_type::EVENT_RSVP,
                    event.entity_id = %event_id,
                    event.actor_id = %user_id,
                    event.result = event::result::SUCCESS,
                    "参加表明を取り消し"
                );
                Ok(RsvpOutcome::Removed)
            }
            RsvpChange::Set(rsvp) => {
                self.rsvps.upsert(&rsvp).await?;
                let status: &'static str = rsvp.status.into();
                log_business_event!(
                    event.category = event::category::EVENT,
                    event.action = event::action::RSVP_SET,
                    event.entity_type = event::entity_type::EVENT_RSVP,
                    event.entity_id = %event_id,
                    event.actor_id = %user_id,
                    event.result = event::result::SUCCESS,
                    rsvp.status = status,
                    "参加表明を登録"
                );
                Ok(RsvpOutcome::Set(rsvp))
            }
        }
    }
}
