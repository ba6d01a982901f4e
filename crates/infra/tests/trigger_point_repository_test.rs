//! トリガーポイントのリポジトリ統合テスト
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p vybbi-infra --test trigger_point_repository_test -- --ignored
//! ```

mod common;

use chrono::Duration;
use common::{fixed_now, new_invitation};
use pretty_assertions::assert_eq;
use sqlx::PgPool;
use vybbi_domain::{
    affiliate::{AffiliateCode, InfluencerLink},
    event::{EventId, EventRsvp, RsvpStatus},
    representation::InvitationStatus,
    user::UserId,
};
use vybbi_infra::repository::{
    EventRsvpRepository,
    InfluencerLinkRepository,
    PostgresEventRsvpRepository,
    PostgresInfluencerLinkRepository,
    PostgresRepresentationInvitationRepository,
    RepresentationInvitationRepository,
};

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_重複コードは一意制約違反になる(pool: PgPool) {
    let repo = PostgresInfluencerLinkRepository::new(pool);
    let code = AffiliateCode::new("NOVA-2024").unwrap();
    let link = |influencer_id| {
        InfluencerLink::new(
            influencer_id,
            code.clone(),
            "https://vybbi.app/artists/nova",
            None,
            fixed_now(),
        )
        .unwrap()
    };

    repo.insert(&link(UserId::new())).await.unwrap();
    let err = repo.insert(&link(UserId::new())).await.unwrap_err();

    assert!(err.is_unique_violation(), "{err:?}");

    let other = InfluencerLink::new(
        UserId::new(),
        AffiliateCode::new("NOVA-2025").unwrap(),
        "https://vybbi.app/artists/nova",
        None,
        fixed_now(),
    )
    .unwrap();
    repo.insert(&other).await.unwrap();
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_rsvpのupsertとdelete(pool: PgPool) {
    let repo = PostgresEventRsvpRepository::new(pool);
    let event_id = EventId::new();
    let user_id = UserId::new();
    let rsvp = |status| EventRsvp {
        event_id: event_id.clone(),
        user_id: user_id.clone(),
        status,
        updated_at: fixed_now(),
    };

    repo.upsert(&rsvp(RsvpStatus::Attending)).await.unwrap();
    repo.upsert(&rsvp(RsvpStatus::NotAttending)).await.unwrap();
    let stored = repo.find(&event_id, &user_id).await.unwrap().unwrap();
    assert_eq!(stored.status, RsvpStatus::NotAttending);

    repo.delete(&event_id, &user_id).await.unwrap();
    assert_eq!(repo.find(&event_id, &user_id).await.unwrap(), None);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_pending以外の招待は更新されない(pool: PgPool) {
    let repo = PostgresRepresentationInvitationRepository::new(pool);
    let invitation = new_invitation(fixed_now());
    repo.insert(&invitation).await.unwrap();

    let accepted = invitation.clone().accept(fixed_now()).unwrap();
    assert!(repo.update_status(&accepted).await.unwrap());

    let declined = invitation.decline(fixed_now()).unwrap();
    assert!(!repo.update_status(&declined).await.unwrap());

    let stored = repo.find_by_id(&accepted.id).await.unwrap().unwrap();
    assert_eq!(stored.status, InvitationStatus::Accepted);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_期限切れのpendingだけがexpiredになる(pool: PgPool) {
    let repo = PostgresRepresentationInvitationRepository::new(pool);
    let old = new_invitation(fixed_now() - Duration::days(8));
    let fresh = new_invitation(fixed_now());
    repo.insert(&old).await.unwrap();
    repo.insert(&fresh).await.unwrap();

    let expired = repo.expire_stale(fixed_now()).await.unwrap();

    assert_eq!(expired, 1);
    let stored = repo.find_by_id(&old.id).await.unwrap().unwrap();
    assert_eq!(stored.status, InvitationStatus::Expired);
    let stored = repo.find_by_id(&fresh.id).await.unwrap().unwrap();
    assert_eq!(stored.status, InvitationStatus::Pending);
}
