// File: xplocal-core/tests/ledger_service_tests.rs
//
// Ledger invariants exercised against the in-memory store, which mirrors
// the atomicity guarantees of the Postgres repositories.

use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use xplocal_common::error::{PurchaseError, RedeemError, TaskError};
use xplocal_common::models::{
    Redemption, RedemptionStatus, Reward, TaskCompletion, TaskKind, Venue,
};
use xplocal_common::traits::repository_traits::{
    BalanceRepository, RedemptionRepository, TaskCompletionRepository, VenueRepository,
};
use xplocal_core::eventbus::{EventBus, LedgerEvent};
use xplocal_core::services::venue_service::{RewardSpec, TaskSpec};
use xplocal_core::services::{LedgerService, VenueService};
use xplocal_core::test_utils::memory::MemoryStore;
use xplocal_core::utils::codes::generate_claim_code;

struct Fixture {
    store: Arc<MemoryStore>,
    bus: Arc<EventBus>,
    ledger: LedgerService,
    venues: VenueService,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(EventBus::new());
    let ledger = LedgerService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        bus.clone(),
    );
    let venues = VenueService::new(store.clone(), store.clone(), store.clone());
    Fixture {
        store,
        bus,
        ledger,
        venues,
    }
}

async fn seed_venue(fx: &Fixture, owner_id: Uuid) -> Venue {
    fx.venues
        .create_venue(
            owner_id,
            "Test Cafe",
            &[
                TaskSpec {
                    kind: TaskKind::GoogleReview,
                    target_url: Some("https://g.page/test".to_string()),
                },
                TaskSpec {
                    kind: TaskKind::IgFollow,
                    target_url: Some("https://instagram.com/test".to_string()),
                },
                TaskSpec {
                    kind: TaskKind::Referral,
                    target_url: None,
                },
            ],
            &[RewardSpec {
                label: "Free Coffee".to_string(),
                cost: 80,
            }],
        )
        .await
        .expect("venue should be created")
}

async fn sole_reward(fx: &Fixture, venue_id: Uuid) -> Reward {
    fx.ledger
        .active_rewards(venue_id)
        .await
        .expect("rewards should list")
        .into_iter()
        .next()
        .expect("seeded reward should exist")
}

// Property: happy path earn -> purchase -> verify -> double verify.
#[tokio::test]
async fn happy_path_earn_purchase_verify() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    // google_review is worth 100 XP
    let outcome = fx
        .ledger
        .complete_task(user, venue.venue_id, TaskKind::GoogleReview)
        .await
        .expect("task should complete");
    assert!(outcome.credited);
    assert_eq!(outcome.amount, 100);
    assert_eq!(fx.ledger.balance(user, venue.venue_id).await.unwrap(), 100);

    // purchase an 80 XP reward
    let reward = sole_reward(&fx, venue.venue_id).await;
    let redemption = fx
        .ledger
        .purchase_reward(user, venue.venue_id, reward.reward_id)
        .await
        .expect("purchase should succeed");
    assert_eq!(fx.ledger.balance(user, venue.venue_id).await.unwrap(), 20);
    assert_eq!(redemption.code.len(), 6);
    assert_eq!(redemption.status, RedemptionStatus::Active);

    // staff verification succeeds once
    let verified = fx
        .ledger
        .verify_and_redeem(owner, &redemption.code)
        .await
        .expect("verification should succeed");
    assert_eq!(verified.status, RedemptionStatus::Inactive);
    assert!(verified.redeemed_at.is_some());

    // and exactly once
    let second = fx.ledger.verify_and_redeem(owner, &redemption.code).await;
    assert!(matches!(second, Err(RedeemError::AlreadyUsed)));
}

// Property: a purchase that would overdraw fails and leaves the balance
// untouched.
#[tokio::test]
async fn insufficient_balance_is_rejected_without_mutation() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    fx.store.credit(user, venue.venue_id, 50).await.unwrap();

    let reward = sole_reward(&fx, venue.venue_id).await; // costs 80
    let result = fx
        .ledger
        .purchase_reward(user, venue.venue_id, reward.reward_id)
        .await;
    assert!(matches!(result, Err(PurchaseError::InsufficientBalance)));
    assert_eq!(fx.ledger.balance(user, venue.venue_id).await.unwrap(), 50);

    // no redemption was created either
    let redemptions = fx
        .ledger
        .redemptions_for_user(user, venue.venue_id)
        .await
        .unwrap();
    assert!(redemptions.is_empty());
}

// Property: second claim at T + 11h59m is refused with
// next_eligible_at = T + 12h; a claim at T + 12h01m succeeds.
#[tokio::test]
async fn cooldown_window_boundaries() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    // last scan 11h59m ago: still cooling down
    let last = Utc::now() - (Duration::hours(11) + Duration::minutes(59));
    TaskCompletionRepository::insert(
        fx.store.as_ref(),
        &TaskCompletion {
            completion_id: Uuid::new_v4(),
            user_id: user,
            venue_id: venue.venue_id,
            task_type: "qr_scan".to_string(),
            completed_at: last,
        },
    )
    .await
    .unwrap();

    let outcome = fx
        .ledger
        .claim_recurring_xp(user, venue.venue_id)
        .await
        .expect("claim should not error");
    assert!(!outcome.credited);
    assert_eq!(outcome.amount, 0);
    assert_eq!(outcome.next_eligible_at, Some(last + Duration::hours(12)));
    assert_eq!(fx.ledger.balance(user, venue.venue_id).await.unwrap(), 0);

    // a different user whose last scan was 12h01m ago is eligible
    let user2 = Uuid::new_v4();
    TaskCompletionRepository::insert(
        fx.store.as_ref(),
        &TaskCompletion {
            completion_id: Uuid::new_v4(),
            user_id: user2,
            venue_id: venue.venue_id,
            task_type: "qr_scan".to_string(),
            completed_at: Utc::now() - (Duration::hours(12) + Duration::minutes(1)),
        },
    )
    .await
    .unwrap();

    let outcome2 = fx
        .ledger
        .claim_recurring_xp(user2, venue.venue_id)
        .await
        .expect("claim should not error");
    assert!(outcome2.credited);
    assert_eq!(outcome2.amount, 50);
    assert_eq!(fx.ledger.balance(user2, venue.venue_id).await.unwrap(), 50);
}

#[tokio::test]
async fn first_scan_credits_and_sets_next_window() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    let outcome = fx
        .ledger
        .claim_recurring_xp(user, venue.venue_id)
        .await
        .unwrap();
    assert!(outcome.credited);
    assert_eq!(outcome.amount, 50);
    assert!(outcome.next_eligible_at.is_some());

    // immediate retry is blocked
    let again = fx
        .ledger
        .claim_recurring_xp(user, venue.venue_id)
        .await
        .unwrap();
    assert!(!again.credited);
    assert_eq!(fx.ledger.balance(user, venue.venue_id).await.unwrap(), 50);
}

// Property: one-time tasks credit exactly once.
#[tokio::test]
async fn one_time_task_is_idempotent() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    let first = fx
        .ledger
        .complete_task(user, venue.venue_id, TaskKind::IgFollow)
        .await
        .unwrap();
    assert!(first.credited);
    assert_eq!(first.amount, 25);

    let second = fx
        .ledger
        .complete_task(user, venue.venue_id, TaskKind::IgFollow)
        .await
        .unwrap();
    assert!(!second.credited);
    assert_eq!(second.amount, 0);
    assert_eq!(fx.ledger.balance(user, venue.venue_id).await.unwrap(), 25);
}

#[tokio::test]
async fn referrals_credit_every_time() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    for _ in 0..3 {
        let outcome = fx
            .ledger
            .complete_task(user, venue.venue_id, TaskKind::Referral)
            .await
            .unwrap();
        assert!(outcome.credited);
    }
    assert_eq!(fx.ledger.balance(user, venue.venue_id).await.unwrap(), 150);
}

#[tokio::test]
async fn recurring_task_cannot_go_through_one_time_path() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    let result = fx
        .ledger
        .complete_task(user, venue.venue_id, TaskKind::Recurring)
        .await;
    assert!(matches!(result, Err(TaskError::NotOneTime)));
}

#[tokio::test]
async fn inactive_task_is_refused() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    let task = fx
        .venues
        .tasks_for_venue(venue.venue_id)
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.action_type == "ig_follow")
        .unwrap();
    fx.venues.set_task_active(task.task_id, false).await.unwrap();

    let result = fx
        .ledger
        .complete_task(user, venue.venue_id, TaskKind::IgFollow)
        .await;
    assert!(matches!(result, Err(TaskError::TaskInactive)));
}

// Property: redeemed_at set by the first verification is not disturbed by
// a failed second attempt.
#[tokio::test]
async fn double_verification_keeps_first_timestamp() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    fx.store.credit(user, venue.venue_id, 100).await.unwrap();
    let reward = sole_reward(&fx, venue.venue_id).await;
    let redemption = fx
        .ledger
        .purchase_reward(user, venue.venue_id, reward.reward_id)
        .await
        .unwrap();

    let verified = fx
        .ledger
        .verify_and_redeem(owner, &redemption.code)
        .await
        .unwrap();
    let first_stamp = verified.redeemed_at.expect("redeemed_at should be set");

    let second = fx.ledger.verify_and_redeem(owner, &redemption.code).await;
    assert!(matches!(second, Err(RedeemError::AlreadyUsed)));

    let stored = fx
        .store
        .find_by_code(&redemption.code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.redeemed_at, Some(first_stamp));
}

// Property: an expired-but-unused code fails Expired and stays active.
#[tokio::test]
async fn expired_code_is_rejected_without_mutation() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;
    let reward = sole_reward(&fx, venue.venue_id).await;

    // created 31 days ago, still active
    let created = Utc::now() - Duration::days(31);
    let redemption = Redemption {
        redemption_id: Uuid::new_v4(),
        user_id: user,
        venue_id: venue.venue_id,
        reward_id: reward.reward_id,
        code: "OLD123".to_string(),
        status: RedemptionStatus::Active,
        created_at: created,
        expires_at: created + Duration::days(30),
        redeemed_at: None,
    };
    assert!(RedemptionRepository::insert(fx.store.as_ref(), &redemption)
        .await
        .unwrap());

    let result = fx.ledger.verify_and_redeem(owner, "OLD123").await;
    assert!(matches!(result, Err(RedeemError::Expired)));

    let stored = fx.store.find_by_code("OLD123").await.unwrap().unwrap();
    assert_eq!(stored.status, RedemptionStatus::Active);
    assert!(stored.redeemed_at.is_none());
}

#[tokio::test]
async fn cross_venue_codes_are_not_redeemable() {
    let fx = fixture();
    let owner_a = Uuid::new_v4();
    let owner_b = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner_a).await;

    fx.store.credit(user, venue.venue_id, 100).await.unwrap();
    let reward = sole_reward(&fx, venue.venue_id).await;
    let redemption = fx
        .ledger
        .purchase_reward(user, venue.venue_id, reward.reward_id)
        .await
        .unwrap();

    let result = fx.ledger.verify_and_redeem(owner_b, &redemption.code).await;
    assert!(matches!(result, Err(RedeemError::NotOwnedByStaffVenue)));

    // code is untouched and still verifiable by the right owner
    let verified = fx
        .ledger
        .verify_and_redeem(owner_a, &redemption.code)
        .await
        .unwrap();
    assert_eq!(verified.status, RedemptionStatus::Inactive);
}

#[tokio::test]
async fn malformed_codes_never_reach_lookup() {
    let fx = fixture();
    let owner = Uuid::new_v4();

    for input in ["", "ABC12", "ABC1234", "AB-12C"] {
        let result = fx.ledger.verify_and_redeem(owner, input).await;
        assert!(matches!(result, Err(RedeemError::NotFound)), "input {:?}", input);
    }
}

#[tokio::test]
async fn lowercase_code_input_is_normalized() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    fx.store.credit(user, venue.venue_id, 100).await.unwrap();
    let reward = sole_reward(&fx, venue.venue_id).await;
    let redemption = fx
        .ledger
        .purchase_reward(user, venue.venue_id, reward.reward_id)
        .await
        .unwrap();

    let verified = fx
        .ledger
        .verify_and_redeem(owner, &format!(" {} ", redemption.code.to_lowercase()))
        .await
        .expect("normalized code should verify");
    assert_eq!(verified.redemption_id, redemption.redemption_id);
}

#[tokio::test]
async fn unknown_or_foreign_rewards_fail_purchase() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;
    let other_venue = seed_venue(&fx, owner).await;

    fx.store.credit(user, venue.venue_id, 500).await.unwrap();

    // nonexistent reward
    let missing = fx
        .ledger
        .purchase_reward(user, venue.venue_id, Uuid::new_v4())
        .await;
    assert!(matches!(missing, Err(PurchaseError::RewardNotFound)));

    // reward that belongs to another venue
    let foreign = sole_reward(&fx, other_venue.venue_id).await;
    let wrong_venue = fx
        .ledger
        .purchase_reward(user, venue.venue_id, foreign.reward_id)
        .await;
    assert!(matches!(wrong_venue, Err(PurchaseError::RewardNotFound)));

    assert_eq!(fx.ledger.balance(user, venue.venue_id).await.unwrap(), 500);
}

// Property: 10k codes allocated through the conflict-guarded insert path
// are all distinct among active redemptions.
#[tokio::test]
async fn allocated_codes_never_collide() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;
    let reward = sole_reward(&fx, venue.venue_id).await;

    let mut codes = HashSet::new();
    let now = Utc::now();
    for _ in 0..10_000 {
        // mirror the service's allocation loop: re-roll on conflict
        let code = loop {
            let candidate = Redemption {
                redemption_id: Uuid::new_v4(),
                user_id: user,
                venue_id: venue.venue_id,
                reward_id: reward.reward_id,
                code: generate_claim_code(),
                status: RedemptionStatus::Active,
                created_at: now,
                expires_at: now + Duration::days(30),
                redeemed_at: None,
            };
            if RedemptionRepository::insert(fx.store.as_ref(), &candidate)
                .await
                .unwrap()
            {
                break candidate.code;
            }
        };
        assert!(codes.insert(code), "allocation path produced a duplicate");
    }
    assert_eq!(codes.len(), 10_000);
}

#[tokio::test]
async fn credit_publishes_ledger_event() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    let mut rx = fx.bus.subscribe(Some(16)).await;
    fx.ledger
        .claim_recurring_xp(user, venue.venue_id)
        .await
        .unwrap();

    match rx.recv().await.expect("event should arrive") {
        LedgerEvent::XpCredited {
            venue_id, amount, ..
        } => {
            assert_eq!(venue_id, venue.venue_id);
            assert_eq!(amount, 50);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn owner_feed_and_stats_reflect_activity() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    fx.ledger
        .complete_task(user_a, venue.venue_id, TaskKind::GoogleReview)
        .await
        .unwrap();
    fx.ledger
        .complete_task(user_b, venue.venue_id, TaskKind::IgFollow)
        .await
        .unwrap();
    fx.ledger
        .claim_recurring_xp(user_a, venue.venue_id)
        .await
        .unwrap();

    let feed = fx.ledger.owner_feed(owner, 50).await.unwrap();
    assert_eq!(feed.len(), 3);

    // the scan entry carries the seeded recurring task's label
    let scan = feed
        .iter()
        .find(|e| e.action_name == "QR_SCAN")
        .expect("scan entry in feed");
    assert_eq!(scan.display_name, TaskKind::Recurring.default_label());

    let stats = fx.ledger.owner_stats(owner).await.unwrap();
    assert_eq!(stats.total_actions, 3);
    assert_eq!(stats.unique_users, 2);
    assert_eq!(stats.google_reviews, 1);
    assert_eq!(stats.ig_follows, 1);
    assert_eq!(stats.check_ins, 1);
}

#[tokio::test]
async fn recurring_task_is_locked_against_toggle_and_delete() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    let recurring = fx
        .venues
        .tasks_for_venue(venue.venue_id)
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.action_type == "recurring")
        .expect("recurring task is always seeded");
    assert!(recurring.is_active);

    let toggled = fx.venues.set_task_active(recurring.task_id, false).await;
    assert!(matches!(toggled, Err(TaskError::RecurringLocked)));

    let deleted = fx.venues.delete_task(recurring.task_id).await;
    assert!(matches!(deleted, Err(TaskError::RecurringLocked)));
}

#[tokio::test]
async fn duplicate_task_specs_collapse_at_onboarding() {
    let fx = fixture();
    let owner = Uuid::new_v4();

    // repeated kinds (and an explicit recurring) must not yield duplicate
    // task rows; the first occurrence wins
    let venue = fx
        .venues
        .create_venue(
            owner,
            "Dup Cafe",
            &[
                TaskSpec {
                    kind: TaskKind::IgFollow,
                    target_url: Some("https://instagram.com/first".to_string()),
                },
                TaskSpec {
                    kind: TaskKind::IgFollow,
                    target_url: Some("https://instagram.com/second".to_string()),
                },
                TaskSpec {
                    kind: TaskKind::Recurring,
                    target_url: None,
                },
            ],
            &[],
        )
        .await
        .expect("venue should be created");

    let tasks = fx.venues.tasks_for_venue(venue.venue_id).await.unwrap();
    assert_eq!(tasks.len(), 2);

    let follows: Vec<_> = tasks
        .iter()
        .filter(|t| t.action_type == "ig_follow")
        .collect();
    assert_eq!(follows.len(), 1);
    assert_eq!(
        follows[0].target_url.as_deref(),
        Some("https://instagram.com/first")
    );
}

#[tokio::test]
async fn venue_onboarding_seeds_tasks_and_rewards() {
    let fx = fixture();
    let owner = Uuid::new_v4();
    let venue = seed_venue(&fx, owner).await;

    let tasks = fx.venues.tasks_for_venue(venue.venue_id).await.unwrap();
    let types: Vec<&str> = tasks.iter().map(|t| t.action_type.as_str()).collect();
    assert!(types.contains(&"recurring"));
    assert!(types.contains(&"google_review"));
    assert!(types.contains(&"ig_follow"));
    assert!(types.contains(&"referral"));

    let rewards = fx.ledger.active_rewards(venue.venue_id).await.unwrap();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].cost, 80);

    let fetched = VenueRepository::get(fx.store.as_ref(), venue.venue_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.scan_cooldown_hours, 12);
    assert_eq!(fetched.code_expiry_days, 30);
    assert!(fetched.slug.starts_with("test-cafe-"));
}
