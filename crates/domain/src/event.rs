//! # イベント参加表明（RSVP）
//!
//! ユーザー × イベントにつき参加表明は高々 1 件。
//! 同じステータスを再度選ぶと取り消し、別のステータスを選ぶと置き換える。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

define_uuid_id! {
    /// イベント ID
    pub struct EventId as "イベント";
}

/// 参加表明ステータス
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RsvpStatus {
    Attending,
    Interested,
    NotAttending,
}

/// 参加表明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRsvp {
    pub event_id:   EventId,
    pub user_id:    UserId,
    pub status:     RsvpStatus,
    pub updated_at: DateTime<Utc>,
}

/// トグル操作の結果として永続化層に要求する変更
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RsvpChange {
    /// 既存の参加表明を削除する
    Remove,
    /// 参加表明を作成または置き換える
    Set(EventRsvp),
}

impl EventRsvp {
    /// 現在の参加表明と選択されたステータスから、必要な変更を決める
    pub fn toggle(
        current: Option<&EventRsvp>,
        event_id: EventId,
        user_id: UserId,
        selected: RsvpStatus,
        now: DateTime<Utc>,
    ) -> RsvpChange {
        match current {
            Some(existing) if existing.status == selected => RsvpChange::Remove,
            _ => RsvpChange::Set(EventRsvp {
                event_id,
                user_id,
                status: selected,
                updated_at: now,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn rsvp(status: RsvpStatus) -> EventRsvp {
        EventRsvp {
            event_id: EventId::new(),
            user_id: UserId::new(),
            status,
            updated_at: now(),
        }
    }

    #[test]
    fn test_未表明なら選択したステータスで作成する() {
        let event_id = EventId::new();
        let user_id = UserId::new();

        let change = EventRsvp::toggle(
            None,
            event_id.clone(),
            user_id.clone(),
            RsvpStatus::Interested,
            now(),
        );

        assert_eq!(
            change,
            RsvpChange::Set(EventRsvp {
                event_id,
                user_id,
                status: RsvpStatus::Interested,
                updated_at: now(),
            })
        );
    }

    #[test]
    fn test_同じステータスを選ぶと取り消す() {
        let current = rsvp(RsvpStatus::Attending);

        let change = EventRsvp::toggle(
            Some(&current),
            current.event_id.clone(),
            current.user_id.clone(),
            RsvpStatus::Attending,
            now(),
        );

        assert_eq!(change, RsvpChange::Remove);
    }

    #[rstest]
    #[case(RsvpStatus::Attending, RsvpStatus::Interested)]
    #[case(RsvpStatus::Interested, RsvpStatus::NotAttending)]
    #[case(RsvpStatus::NotAttending, RsvpStatus::Attending)]
    fn test_別のステータスを選ぶと置き換える(
        #[case] before: RsvpStatus,
        #[case] selected: RsvpStatus,
    ) {
        let current = rsvp(before);

        let change = EventRsvp::toggle(
            Some(&current),
            current.event_id.clone(),
            current.user_id.clone(),
            selected,
            now(),
        );

        let RsvpChange::Set(updated) = change else {
            panic!("expected Set, got {change:?}");
        };
        assert_eq!(updated.status, selected);
    }

    #[test]
    fn test_ステータスの文字列表現() {
        assert_eq!(RsvpStatus::NotAttending.to_string(), "not_attending");
        assert_eq!(
            RsvpStatus::from_str("interested").unwrap(),
            RsvpStatus::Interested
        );
        assert!(RsvpStatus::from_str("maybe").is_err());
    }
}
