//! 通知まわりのリポジトリ統合テスト
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p vybbi-infra --test notification_repository_test -- --ignored
//! ```

mod common;

use chrono::Duration;
use common::{fixed_now, new_notification};
use pretty_assertions::assert_eq;
use sqlx::PgPool;
use vybbi_domain::{email_template::EmailTemplate, user::UserId};
use vybbi_infra::repository::{
    EmailTemplateRepository,
    NotificationPreferenceRepository,
    NotificationRepository,
    PostgresEmailTemplateRepository,
    PostgresNotificationPreferenceRepository,
    PostgresNotificationRepository,
};

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_通知行を挿入して送信済みにできる(pool: PgPool) {
    let repo = PostgresNotificationRepository::new(pool);
    let notification = new_notification(&UserId::new());

    repo.insert(&notification).await.unwrap();
    let stored = repo.find_by_id(&notification.id).await.unwrap().unwrap();
    assert!(!stored.email_sent);
    assert_eq!(stored.data, notification.data);

    let sent_at = fixed_now() + Duration::seconds(3);
    repo.mark_email_sent(&notification.id, sent_at).await.unwrap();

    let stored = repo.find_by_id(&notification.id).await.unwrap().unwrap();
    assert!(stored.email_sent);
    assert_eq!(stored.email_sent_at, Some(sent_at));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_受信設定がない場合はnone(pool: PgPool) {
    let user_id = UserId::new();
    sqlx::query(
        "INSERT INTO notification_preferences (user_id, notification_type, email_enabled) VALUES ($1, 'message_received', FALSE)",
    )
    .bind(user_id.as_uuid())
    .execute(&pool)
    .await
    .unwrap();

    let repo = PostgresNotificationPreferenceRepository::new(pool);

    let disabled = repo.find(&user_id, "message_received").await.unwrap();
    assert_eq!(disabled.map(|p| p.email_enabled), Some(false));
    assert_eq!(repo.find(&user_id, "booking_request").await.unwrap(), None);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_無効なテンプレートはfind_activeで返らない(pool: PgPool) {
    let repo = PostgresEmailTemplateRepository::new(pool);
    let template = EmailTemplate::new(
        "user_registration",
        "Bienvenue {{userName}}",
        "<p>{{profileType}}</p>",
        true,
        fixed_now(),
    )
    .unwrap();
    repo.upsert(&template).await.unwrap();
    assert!(repo.find_active("user_registration").await.unwrap().is_some());

    let deactivated = EmailTemplate {
        is_active: false,
        ..template
    };
    repo.upsert(&deactivated).await.unwrap();

    assert_eq!(repo.find_active("user_registration").await.unwrap(), None);
    assert_eq!(repo.find_all().await.unwrap(), vec![deactivated]);
}
