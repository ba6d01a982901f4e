//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するエンティティ生成ヘルパー。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde_json::json;
use vybbi_domain::{
    notification::{NewNotification, Notification},
    representation::{Invitee, RepresentationInvitation, RepresentationRole},
    user::UserId,
};

/// テストで使う固定時刻
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_729_252_800, 0).unwrap()
}

pub fn new_notification(user_id: &UserId) -> Notification {
    Notification::new(NewNotification {
        user_id: user_id.clone(),
        notification_type: "booking_request".to_string(),
        title: "Nouvelle demande de booking".to_string(),
        message: "Le Trabendo souhaite vous programmer".to_string(),
        data: json!({ "artistName": "Nova", "venueName": "Le Trabendo", "eventDate": "2024-11-02" }),
        related_id: None,
        now: fixed_now(),
    })
}

pub fn new_invitation(now: DateTime<Utc>) -> RepresentationInvitation {
    RepresentationInvitation::new(
        UserId::new(),
        RepresentationRole::Agent,
        &Invitee::Artist {
            artist_id: UserId::new(),
        },
        now,
    )
}
