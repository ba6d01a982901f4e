//! 通知種別ごとの型付きペイロード
//!
//! HTTP で受け取る `data` は自由形式の JSON だが、組み込み種別については
//! ここで型付きレコードに変換し、必須フィールドの欠落を 400 として弾く。
//! 型に含まれない追加キーは捨てずに保持し、テンプレートのプレースホルダー
//! から参照できるようにする。

use std::str::FromStr;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use super::NotificationType;
use crate::DomainError;

/// `user_registration`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistrationData {
    pub user_name:    String,
    /// artist / venue / agent / manager / influencer
    pub profile_type: String,
}

/// `booking_request`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequestData {
    pub artist_name: String,
    pub venue_name:  String,
    pub event_date:  String,
    #[serde(default)]
    pub message:     Option<String>,
}

/// `booking_status_changed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusChangedData {
    pub artist_name: String,
    pub venue_name:  String,
    pub event_date:  String,
    pub status:      String,
}

/// `message_received`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReceivedData {
    pub sender_name:     String,
    pub message_preview: String,
}

/// `review_received`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReceivedData {
    pub reviewer_name: String,
    pub rating:        u8,
    #[serde(default)]
    pub comment:       Option<String>,
}

/// `event_reminder`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReminderData {
    pub event_title: String,
    pub event_date:  String,
    #[serde(default)]
    pub venue_name:  Option<String>,
}

/// `representation_invitation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepresentationInvitationData {
    pub inviter_name:  String,
    /// agent / manager
    pub inviter_role:  String,
    #[serde(default)]
    pub invitee_name:  Option<String>,
    #[serde(default)]
    pub invitation_id: Option<String>,
}

/// `affiliate_conversion`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateConversionData {
    pub influencer_name: String,
    pub code:            String,
    /// signup / booking / subscription
    pub conversion_type: String,
    #[serde(default)]
    pub commission:      Option<String>,
}

/// 組み込み種別の型付きデータ（通知種別をタグとする直和型）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NotificationData {
    UserRegistration(UserRegistrationData),
    BookingRequest(BookingRequestData),
    BookingStatusChanged(BookingStatusChangedData),
    MessageReceived(MessageReceivedData),
    ReviewReceived(ReviewReceivedData),
    EventReminder(EventReminderData),
    RepresentationInvitation(RepresentationInvitationData),
    AffiliateConversion(AffiliateConversionData),
}

impl NotificationData {
    /// 通知種別と JSON から型付きデータを構築する
    ///
    /// `data` が `null` の場合は空オブジェクトとして扱う（必須フィールドの欠落エラーになる）。
    pub fn parse(notification_type: NotificationType, data: &Value) -> Result<Self, DomainError> {
        let data = match data {
            Value::Null => Value::Object(Map::new()),
            other => other.clone(),
        };

        Ok(match notification_type {
            NotificationType::UserRegistration => {
                Self::UserRegistration(decode(notification_type, data)?)
            }
            NotificationType::BookingRequest => Self::BookingRequest(decode(notification_type, data)?),
            NotificationType::BookingStatusChanged => {
                Self::BookingStatusChanged(decode(notification_type, data)?)
            }
            NotificationType::MessageReceived => {
                Self::MessageReceived(decode(notification_type, data)?)
            }
            NotificationType::ReviewReceived => Self::ReviewReceived(decode(notification_type, data)?),
            NotificationType::EventReminder => Self::EventReminder(decode(notification_type, data)?),
            NotificationType::RepresentationInvitation => {
                Self::RepresentationInvitation(decode(notification_type, data)?)
            }
            NotificationType::AffiliateConversion => {
                Self::AffiliateConversion(decode(notification_type, data)?)
            }
        })
    }

    pub fn notification_type(&self) -> NotificationType {
        match self {
            Self::UserRegistration(_) => NotificationType::UserRegistration,
            Self::BookingRequest(_) => NotificationType::BookingRequest,
            Self::BookingStatusChanged(_) => NotificationType::BookingStatusChanged,
            Self::MessageReceived(_) => NotificationType::MessageReceived,
            Self::ReviewReceived(_) => NotificationType::ReviewReceived,
            Self::EventReminder(_) => NotificationType::EventReminder,
            Self::RepresentationInvitation(_) => NotificationType::RepresentationInvitation,
            Self::AffiliateConversion(_) => NotificationType::AffiliateConversion,
        }
    }

    /// テンプレート用のフィールドマップ（camelCase キー）
    ///
    /// 任意フィールドが未指定の場合は空文字列になる。
    pub fn fields(&self) -> Map<String, Value> {
        let value = match serde_json::to_value(self) {
            Ok(Value::Object(mut tagged)) => tagged.remove("data").unwrap_or(Value::Null),
            _ => Value::Null,
        };

        let Value::Object(fields) = value else {
            return Map::new();
        };

        fields
            .into_iter()
            .map(|(key, value)| match value {
                Value::Null => (key, Value::String(String::new())),
                other => (key, other),
            })
            .collect()
    }
}

fn decode<T: DeserializeOwned>(
    notification_type: NotificationType,
    data: Value,
) -> Result<T, DomainError> {
    serde_json::from_value(data).map_err(|e| {
        DomainError::Validation(format!("{notification_type} の data が不正です: {e}"))
    })
}

/// 受信した通知ペイロード
///
/// 組み込み種別なら型付きデータ、それ以外は元の JSON をそのまま保持する。
/// 未知の種別はエラーにせず、汎用フォールバックテンプレートで送信される。
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationPayload {
    Known {
        data:  NotificationData,
        /// 型に含まれない追加キー
        extra: Map<String, Value>,
    },
    Unknown {
        type_name: String,
        data:      Value,
    },
}

impl NotificationPayload {
    /// HTTP リクエストの `type` と `data` から構築する
    pub fn from_request(type_name: &str, data: Value) -> Result<Self, DomainError> {
        let type_name = type_name.trim();
        if type_name.is_empty() {
            return Err(DomainError::Validation("type は必須です".to_string()));
        }

        let Ok(notification_type) = NotificationType::from_str(type_name) else {
            return Ok(Self::Unknown {
                type_name: type_name.to_string(),
                data,
            });
        };

        let typed = NotificationData::parse(notification_type, &data)?;
        let known_keys = typed.fields();
        let extra = match data {
            Value::Object(map) => map
                .into_iter()
                .filter(|(key, _)| !known_keys.contains_key(key))
                .collect(),
            _ => Map::new(),
        };

        Ok(Self::Known { data: typed, extra })
    }

    /// 組み込み種別の場合のみ `Some`
    pub fn notification_type(&self) -> Option<NotificationType> {
        match self {
            Self::Known { data, .. } => Some(data.notification_type()),
            Self::Unknown { .. } => None,
        }
    }

    /// 通知種別の文字列表現
    pub fn type_name(&self) -> String {
        match self {
            Self::Known { data, .. } => data.notification_type().to_string(),
            Self::Unknown { type_name, .. } => type_name.clone(),
        }
    }

    /// プレースホルダー置換に使うコンテキスト
    ///
    /// 型付きフィールドが追加キーより優先される。
    pub fn context(&self) -> Map<String, Value> {
        match self {
            Self::Known { data, extra } => {
                let mut context = extra.clone();
                context.extend(data.fields());
                context
            }
            Self::Unknown { data, .. } => match data {
                Value::Object(map) => map.clone(),
                _ => Map::new(),
            },
        }
    }

    /// 元の JSON 表現（汎用フォールバックのダンプや通知行の `data` に使う）
    pub fn raw_data(&self) -> Value {
        match self {
            Self::Known { .. } => Value::Object(self.context()),
            Self::Unknown { data, .. } => data.clone(),
        }
    }
}
