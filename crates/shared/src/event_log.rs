//! # 構造化ログのフィールド定数
//!
//! 通知の送信結果やトリガー操作（リンク作成、RSVP、招待）は
//! [`log_business_event!`] で出す。JSON 出力では `event.kind` が
//! `"business_event"` の行だけを拾えば、操作の監査ログになる。
//!
//! 内部エラーは `tracing::error!` に `error.category` と `error.kind` を付けて出す。
//! どちらも値は下の定数モジュールから選ぶ。

/// 操作ログを `info` レベルで出す
///
/// `event.category` / `event.action` / `event.result` は毎回付ける。
/// 対象が特定できる場合は `event.entity_type` / `event.entity_id` も付ける。
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const NOTIFICATION: &str = "notification";
        pub const AFFILIATE: &str = "affiliate";
        pub const EVENT: &str = "event";
        pub const REPRESENTATION: &str = "representation";
        pub const EMAIL_TEMPLATE: &str = "email_template";
    }

    /// イベントアクション
    pub mod action {
        // 通知
        pub const NOTIFICATION_PERSISTED: &str = "notification.persisted";
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_SKIPPED: &str = "notification.skipped";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";

        // アフィリエイト
        pub const AFFILIATE_LINK_CREATED: &str = "affiliate_link.created";

        // RSVP
        pub const RSVP_SET: &str = "rsvp.set";
        pub const RSVP_REMOVED: &str = "rsvp.removed";

        // 代理人招待
        pub const INVITATION_CREATED: &str = "invitation.created";
        pub const INVITATION_ACCEPTED: &str = "invitation.accepted";
        pub const INVITATION_DECLINED: &str = "invitation.declined";
        pub const INVITATION_CANCELLED: &str = "invitation.cancelled";
        pub const INVITATION_EXPIRED: &str = "invitation.expired";

        // テンプレート
        pub const EMAIL_TEMPLATE_SAVED: &str = "email_template.saved";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const NOTIFICATION: &str = "notification";
        pub const INFLUENCER_LINK: &str = "influencer_link";
        pub const EVENT_RSVP: &str = "event_rsvp";
        pub const REPRESENTATION_INVITATION: &str = "representation_invitation";
        pub const EMAIL_TEMPLATE: &str = "email_template";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
        pub const SKIPPED: &str = "skipped";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（DB）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（メールプロバイダ、認証プロバイダ）
        pub const EXTERNAL_SERVICE: &str = "external_service";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const INTERNAL: &str = "internal";
        pub const USER_LOOKUP: &str = "user_lookup";
        pub const EMAIL_DELIVERY: &str = "email_delivery";
        pub const TEMPLATE: &str = "template";
    }
}

#[cfg(test)]
mod tests {
    use super::event::{action, category, entity_type, result};

    #[test]
    fn test_操作ログを出力できる() {
        crate::log_business_event!(
            event.category = category::AFFILIATE,
            event.action = action::AFFILIATE_LINK_CREATED,
            event.entity_type = entity_type::INFLUENCER_LINK,
            event.entity_id = "link-1",
            event.result = result::SUCCESS,
            "アフィリエイトリンクを作成"
        );
    }
}
