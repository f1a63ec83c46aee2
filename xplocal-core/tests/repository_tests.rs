// File: xplocal-core/tests/repository_tests.rs
//
// Integration tests for the Postgres repositories. These need a running
// Postgres reachable via TEST_DATABASE_URL and are #[ignore]d by default:
//
//   cargo test --test repository_tests -- --ignored

use chrono::{Duration, Utc};
use uuid::Uuid;

use xplocal_common::models::{
    ActivityLogEntry, Redemption, RedemptionStatus, Reward, TaskCompletion, User, Venue,
};
use xplocal_common::traits::repository_traits::{
    ActivityLogRepository, BalanceRepository, RedemptionRepository, RewardRepository,
    TaskCompletionRepository, UserRepository, VenueRepository,
};
use xplocal_core::repositories::postgres::{
    PostgresActivityLogRepository, PostgresBalanceRepository, PostgresRedemptionRepository,
    PostgresRewardRepository, PostgresTaskCompletionRepository, PostgresUserRepository,
    PostgresVenueRepository,
};
use xplocal_core::test_utils::helpers::setup_test_database;
use xplocal_core::Database;

fn sample_venue(owner_id: Uuid) -> Venue {
    let now = Utc::now();
    let id = Uuid::new_v4();
    Venue {
        venue_id: id,
        owner_id,
        name: "Test Venue".to_string(),
        slug: format!("test-venue-{}", id.simple()),
        scan_xp_amount: 50,
        scan_cooldown_hours: 12,
        code_expiry_days: 30,
        created_at: now,
        updated_at: now,
    }
}

async fn seed_user_and_venue(db: &Database) -> (User, Venue) {
    let user_repo = PostgresUserRepository::new(db.pool().clone());
    let venue_repo = PostgresVenueRepository::new(db.pool().clone());

    let user = User::new(Some("tester"));
    user_repo.create(&user).await.expect("user insert");

    let venue = sample_venue(user.user_id);
    venue_repo.create(&venue).await.expect("venue insert");
    (user, venue)
}

#[tokio::test]
#[ignore]
async fn test_user_roundtrip() {
    let db = setup_test_database().await.expect("test db");
    let repo = PostgresUserRepository::new(db.pool().clone());

    let user = User::new(Some("alice"));
    repo.create(&user).await.expect("insert");

    let fetched = repo.get(user.user_id).await.expect("get").expect("found");
    assert_eq!(fetched.display_name.as_deref(), Some("alice"));
    assert!(fetched.is_active);

    let later = Utc::now() + Duration::minutes(5);
    repo.touch_last_seen(user.user_id, later).await.expect("touch");
    let touched = repo.get(user.user_id).await.expect("get").expect("found");
    assert!(touched.last_seen > fetched.last_seen);

    repo.delete(user.user_id).await.expect("delete");
    assert!(repo.get(user.user_id).await.expect("get").is_none());
}

#[tokio::test]
#[ignore]
async fn test_venue_lookup_by_slug_and_owner() {
    let db = setup_test_database().await.expect("test db");
    let repo = PostgresVenueRepository::new(db.pool().clone());
    let (user, venue) = seed_user_and_venue(&db).await;

    let by_slug = repo
        .get_by_slug(&venue.slug)
        .await
        .expect("get_by_slug")
        .expect("found");
    assert_eq!(by_slug.venue_id, venue.venue_id);

    let owned = repo.list_by_owner(user.user_id).await.expect("list");
    assert_eq!(owned.len(), 1);

    repo.update_name(venue.venue_id, "Renamed").await.expect("rename");
    let renamed = repo.get(venue.venue_id).await.expect("get").expect("found");
    assert_eq!(renamed.name, "Renamed");
    // slug is stable across renames
    assert_eq!(renamed.slug, venue.slug);
}

#[tokio::test]
#[ignore]
async fn test_balance_credit_and_conditional_debit() {
    let db = setup_test_database().await.expect("test db");
    let repo = PostgresBalanceRepository::new(db.pool().clone());
    let (user, venue) = seed_user_and_venue(&db).await;

    assert_eq!(repo.get(user.user_id, venue.venue_id).await.expect("get"), 0);

    repo.credit(user.user_id, venue.venue_id, 100).await.expect("credit");
    repo.credit(user.user_id, venue.venue_id, 25).await.expect("credit");
    assert_eq!(repo.get(user.user_id, venue.venue_id).await.expect("get"), 125);

    assert!(repo
        .debit_if_sufficient(user.user_id, venue.venue_id, 100)
        .await
        .expect("debit"));
    // 25 left; a 100 debit must be refused without changing the row
    assert!(!repo
        .debit_if_sufficient(user.user_id, venue.venue_id, 100)
        .await
        .expect("debit"));
    assert_eq!(repo.get(user.user_id, venue.venue_id).await.expect("get"), 25);
}

#[tokio::test]
#[ignore]
async fn test_one_time_completion_unique_index() {
    let db = setup_test_database().await.expect("test db");
    let repo = PostgresTaskCompletionRepository::new(db.pool().clone());
    let (user, venue) = seed_user_and_venue(&db).await;

    let completion = TaskCompletion {
        completion_id: Uuid::new_v4(),
        user_id: user.user_id,
        venue_id: venue.venue_id,
        task_type: "ig_follow".to_string(),
        completed_at: Utc::now(),
    };
    assert!(repo.insert_once(&completion).await.expect("first insert"));

    let again = TaskCompletion {
        completion_id: Uuid::new_v4(),
        completed_at: Utc::now(),
        ..completion.clone()
    };
    assert!(!repo.insert_once(&again).await.expect("second insert"));

    let listed = repo
        .list_for_user_venue(user.user_id, venue.venue_id)
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_cooldown_guarded_insert() {
    let db = setup_test_database().await.expect("test db");
    let repo = PostgresTaskCompletionRepository::new(db.pool().clone());
    let (user, venue) = seed_user_and_venue(&db).await;

    let now = Utc::now();
    let first = TaskCompletion {
        completion_id: Uuid::new_v4(),
        user_id: user.user_id,
        venue_id: venue.venue_id,
        task_type: "qr_scan".to_string(),
        completed_at: now,
    };
    assert!(repo
        .insert_if_none_since(&first, now - Duration::hours(12))
        .await
        .expect("first claim"));

    // inside the window
    let second = TaskCompletion {
        completion_id: Uuid::new_v4(),
        completed_at: now,
        ..first.clone()
    };
    assert!(!repo
        .insert_if_none_since(&second, now - Duration::hours(12))
        .await
        .expect("second claim"));

    let latest = repo
        .latest_completion(user.user_id, venue.venue_id, "qr_scan")
        .await
        .expect("latest")
        .expect("present");
    // timestamps survive the round trip to microsecond precision
    assert!((latest - now).num_milliseconds().abs() < 5);
}

#[tokio::test]
#[ignore]
async fn test_redemption_code_conflict_and_single_flip() {
    let db = setup_test_database().await.expect("test db");
    let reward_repo = PostgresRewardRepository::new(db.pool().clone());
    let redemption_repo = PostgresRedemptionRepository::new(db.pool().clone());
    let (user, venue) = seed_user_and_venue(&db).await;

    let reward = Reward::new(venue.venue_id, "Free Coffee", 80);
    reward_repo.create(&reward).await.expect("reward insert");

    let now = Utc::now();
    let redemption = Redemption {
        redemption_id: Uuid::new_v4(),
        user_id: user.user_id,
        venue_id: venue.venue_id,
        reward_id: reward.reward_id,
        code: "AB12CD".to_string(),
        status: RedemptionStatus::Active,
        created_at: now,
        expires_at: now + Duration::days(30),
        redeemed_at: None,
    };
    assert!(redemption_repo.insert(&redemption).await.expect("insert"));

    // same code, different row: refused, caller re-rolls
    let clash = Redemption {
        redemption_id: Uuid::new_v4(),
        ..redemption.clone()
    };
    assert!(!redemption_repo.insert(&clash).await.expect("clash insert"));

    let found = redemption_repo
        .find_by_code("AB12CD")
        .await
        .expect("find")
        .expect("present");
    assert_eq!(found.redemption_id, redemption.redemption_id);
    assert_eq!(found.status, RedemptionStatus::Active);

    assert!(redemption_repo
        .mark_redeemed_if_active(redemption.redemption_id, Utc::now())
        .await
        .expect("first flip"));
    assert!(!redemption_repo
        .mark_redeemed_if_active(redemption.redemption_id, Utc::now())
        .await
        .expect("second flip"));

    let flipped = redemption_repo
        .find_by_code("AB12CD")
        .await
        .expect("find")
        .expect("present");
    assert_eq!(flipped.status, RedemptionStatus::Inactive);
    assert!(flipped.redeemed_at.is_some());
}

#[tokio::test]
#[ignore]
async fn test_owner_feed_spans_venues() {
    let db = setup_test_database().await.expect("test db");
    let venue_repo = PostgresVenueRepository::new(db.pool().clone());
    let activity_repo = PostgresActivityLogRepository::new(db.pool().clone());
    let (user, venue_a) = seed_user_and_venue(&db).await;

    let venue_b = sample_venue(user.user_id);
    venue_repo.create(&venue_b).await.expect("venue insert");

    activity_repo
        .insert(&ActivityLogEntry::new(
            venue_a.venue_id,
            user.user_id,
            50,
            "Recurring Visit",
            "QR_SCAN",
        ))
        .await
        .expect("log a");
    activity_repo
        .insert(&ActivityLogEntry::new(
            venue_b.venue_id,
            user.user_id,
            100,
            "Google Review",
            "GOOGLE_REVIEW",
        ))
        .await
        .expect("log b");

    let per_venue = activity_repo
        .list_for_venue(venue_a.venue_id, 10)
        .await
        .expect("venue feed");
    assert_eq!(per_venue.len(), 1);

    let feed = activity_repo
        .list_for_owner(user.user_id, 10)
        .await
        .expect("owner feed");
    assert_eq!(feed.len(), 2);
    // newest first
    assert!(feed[0].created_at >= feed[1].created_at);
}
