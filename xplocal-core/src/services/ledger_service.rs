use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use xplocal_common::error::{Error, PurchaseError, RedeemError, TaskError};
use xplocal_common::models::{
    ActivityLogEntry, ClaimOutcome, OwnerStats, Redemption, RedemptionStatus, Reward,
    TaskCompletion, TaskKind, TaskOutcome,
};
use xplocal_common::traits::repository_traits::{
    ActivityLogRepository, BalanceRepository, EarningTaskRepository, RedemptionRepository,
    RewardRepository, TaskCompletionRepository, VenueRepository,
};

use crate::eventbus::{EventBus, LedgerEvent};
use crate::utils::codes::{generate_claim_code, normalize_claim_code};
use crate::utils::time::next_eligible;

/// How many fresh codes we roll before giving up on a purchase. With a
/// 36^6 code space this only trips if something is badly wrong.
const MAX_CODE_ATTEMPTS: u32 = 8;

/// Feed window used for owner stat aggregation.
const STATS_FEED_LIMIT: i64 = 1000;

/// The Loyalty Ledger: every XP-affecting operation goes through here, and
/// every invariant (non-negative balance, cooldown windows, one-time
/// idempotence, single-use codes) is enforced on this side of the trust
/// boundary. Callers supply explicit caller identity; nothing here reads
/// ambient session state.
pub struct LedgerService {
    venue_repo: Arc<dyn VenueRepository>,
    task_repo: Arc<dyn EarningTaskRepository>,
    completion_repo: Arc<dyn TaskCompletionRepository>,
    balance_repo: Arc<dyn BalanceRepository>,
    reward_repo: Arc<dyn RewardRepository>,
    redemption_repo: Arc<dyn RedemptionRepository>,
    activity_repo: Arc<dyn ActivityLogRepository>,
    event_bus: Arc<EventBus>,
}

impl LedgerService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        venue_repo: Arc<dyn VenueRepository>,
        task_repo: Arc<dyn EarningTaskRepository>,
        completion_repo: Arc<dyn TaskCompletionRepository>,
        balance_repo: Arc<dyn BalanceRepository>,
        reward_repo: Arc<dyn RewardRepository>,
        redemption_repo: Arc<dyn RedemptionRepository>,
        activity_repo: Arc<dyn ActivityLogRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            venue_repo,
            task_repo,
            completion_repo,
            balance_repo,
            reward_repo,
            redemption_repo,
            activity_repo,
            event_bus,
        }
    }

    /// QR check-in claim. Credits the venue's scan XP unless the user is
    /// inside the rolling cooldown window measured from their most recent
    /// scan. Concurrent claims for the same (user, venue) are serialized in
    /// the completions repository so double-credit is impossible.
    pub async fn claim_recurring_xp(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
    ) -> Result<ClaimOutcome, TaskError> {
        let venue = self
            .venue_repo
            .get(venue_id)
            .await?
            .ok_or(TaskError::VenueNotFound)?;

        let cooldown = venue.cooldown();
        let now = Utc::now();
        let tag = TaskKind::Recurring.completion_tag();

        let completion = TaskCompletion {
            completion_id: Uuid::new_v4(),
            user_id,
            venue_id,
            task_type: tag.to_string(),
            completed_at: now,
        };

        let cutoff = now - cooldown;
        let inserted = self
            .completion_repo
            .insert_if_none_since(&completion, cutoff)
            .await?;

        if !inserted {
            // Cooldown still running; report when it ends, mutate nothing.
            let last = self
                .completion_repo
                .latest_completion(user_id, venue_id, tag)
                .await?;
            debug!("scan claim inside cooldown: user={} venue={}", user_id, venue_id);
            return Ok(ClaimOutcome {
                credited: false,
                amount: 0,
                next_eligible_at: last.map(|l| next_eligible(l, cooldown)),
            });
        }

        let amount = venue.scan_xp_amount;
        self.balance_repo.credit(user_id, venue_id, amount).await?;

        self.record_activity(
            venue_id,
            user_id,
            amount,
            TaskKind::Recurring.default_label(),
            "QR_SCAN",
        )
        .await;

        self.event_bus
            .publish(LedgerEvent::XpCredited {
                venue_id,
                user_id,
                amount,
                action: tag.to_string(),
                timestamp: now,
            })
            .await;

        info!("scan claim credited {} XP: user={} venue={}", amount, user_id, venue_id);
        Ok(ClaimOutcome {
            credited: true,
            amount,
            next_eligible_at: Some(next_eligible(now, cooldown)),
        })
    }

    /// One-time (or referral) task completion. One-time kinds credit at most
    /// once ever per (user, venue); a repeat attempt is reported as
    /// `credited = false` with no mutation. Referrals credit every time.
    pub async fn complete_task(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
        kind: TaskKind,
    ) -> Result<TaskOutcome, TaskError> {
        if kind == TaskKind::Recurring {
            return Err(TaskError::NotOneTime);
        }

        let task = self
            .task_repo
            .find_by_type(venue_id, kind.as_str())
            .await?
            .ok_or(TaskError::TaskNotFound)?;
        if !task.is_active {
            return Err(TaskError::TaskInactive);
        }

        let now = Utc::now();
        let completion = TaskCompletion {
            completion_id: Uuid::new_v4(),
            user_id,
            venue_id,
            task_type: kind.completion_tag().to_string(),
            completed_at: now,
        };

        let credited = if kind.is_one_time() {
            self.completion_repo.insert_once(&completion).await?
        } else {
            self.completion_repo.insert(&completion).await?;
            true
        };

        if !credited {
            debug!(
                "task '{}' already completed: user={} venue={}",
                kind.as_str(),
                user_id,
                venue_id
            );
            return Ok(TaskOutcome {
                credited: false,
                amount: 0,
            });
        }

        self.balance_repo
            .credit(user_id, venue_id, task.xp_amount)
            .await?;

        self.record_activity(
            venue_id,
            user_id,
            task.xp_amount,
            &task.label,
            &kind.as_str().to_uppercase(),
        )
        .await;

        self.event_bus
            .publish(LedgerEvent::XpCredited {
                venue_id,
                user_id,
                amount: task.xp_amount,
                action: kind.as_str().to_string(),
                timestamp: now,
            })
            .await;

        Ok(TaskOutcome {
            credited: true,
            amount: task.xp_amount,
        })
    }

    /// Purchase a reward: debit-then-issue-code, atomically with respect to
    /// concurrent purchases racing on the same balance. Returns the fresh
    /// `active` redemption with its single-use code.
    pub async fn purchase_reward(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
        reward_id: Uuid,
    ) -> Result<Redemption, PurchaseError> {
        let venue = self
            .venue_repo
            .get(venue_id)
            .await?
            .ok_or(PurchaseError::RewardNotFound)?;

        let reward = self
            .reward_repo
            .get(reward_id)
            .await?
            .filter(|r| r.venue_id == venue_id && r.is_active)
            .ok_or(PurchaseError::RewardNotFound)?;

        let debited = self
            .balance_repo
            .debit_if_sufficient(user_id, venue_id, reward.cost)
            .await?;
        if !debited {
            return Err(PurchaseError::InsufficientBalance);
        }

        let redemption = match self.issue_redemption(user_id, &venue, &reward).await {
            Ok(r) => r,
            Err(e) => {
                // The debit already landed; put the XP back before failing.
                warn!("code issuance failed, refunding {} XP: {}", reward.cost, e);
                self.balance_repo
                    .credit(user_id, venue_id, reward.cost)
                    .await?;
                return Err(e.into());
            }
        };

        self.record_activity(
            venue_id,
            user_id,
            -reward.cost,
            "Marketplace Purchase",
            &reward.label,
        )
        .await;

        self.event_bus
            .publish(LedgerEvent::XpSpent {
                venue_id,
                user_id,
                amount: reward.cost,
                reward_label: reward.label.clone(),
                code: redemption.code.clone(),
                timestamp: redemption.created_at,
            })
            .await;

        info!(
            "reward '{}' purchased for {} XP: user={} venue={}",
            reward.label, reward.cost, user_id, venue_id
        );
        Ok(redemption)
    }

    async fn issue_redemption(
        &self,
        user_id: Uuid,
        venue: &xplocal_common::models::Venue,
        reward: &Reward,
    ) -> Result<Redemption, Error> {
        let now = Utc::now();
        for _ in 0..MAX_CODE_ATTEMPTS {
            let redemption = Redemption {
                redemption_id: Uuid::new_v4(),
                user_id,
                venue_id: venue.venue_id,
                reward_id: reward.reward_id,
                code: generate_claim_code(),
                status: RedemptionStatus::Active,
                created_at: now,
                expires_at: now + venue.code_expiry(),
                redeemed_at: None,
            };
            if self.redemption_repo.insert(&redemption).await? {
                return Ok(redemption);
            }
            debug!("claim code collision, re-rolling");
        }
        Err(Error::Parse(
            "exhausted claim code attempts".to_string(),
        ))
    }

    /// Staff verification of a claim code. Exactly-once: the status flip is
    /// conditional on the row still being `active`, so double submission
    /// (or a race between two staff devices) yields `AlreadyUsed` for the
    /// loser without touching `redeemed_at` again.
    pub async fn verify_and_redeem(
        &self,
        staff_owner_id: Uuid,
        raw_code: &str,
    ) -> Result<Redemption, RedeemError> {
        let code = normalize_claim_code(raw_code).ok_or(RedeemError::NotFound)?;

        let mut redemption = self
            .redemption_repo
            .find_by_code(&code)
            .await?
            .ok_or(RedeemError::NotFound)?;

        let venue = self
            .venue_repo
            .get(redemption.venue_id)
            .await?
            .ok_or(RedeemError::NotFound)?;
        if venue.owner_id != staff_owner_id {
            // Surfaced to HTTP as the same 404 body as NotFound so codes are
            // not discoverable across venues.
            return Err(RedeemError::NotOwnedByStaffVenue);
        }

        if redemption.status != RedemptionStatus::Active {
            return Err(RedeemError::AlreadyUsed);
        }

        let now = Utc::now();
        if redemption.is_expired_at(now) {
            // Expired codes are never flipped; they stay distinguishable
            // from used ones.
            return Err(RedeemError::Expired);
        }

        let flipped = self
            .redemption_repo
            .mark_redeemed_if_active(redemption.redemption_id, now)
            .await?;
        if !flipped {
            return Err(RedeemError::AlreadyUsed);
        }

        redemption.status = RedemptionStatus::Inactive;
        redemption.redeemed_at = Some(now);

        let reward_label = self
            .reward_repo
            .get(redemption.reward_id)
            .await?
            .map(|r| r.label)
            .unwrap_or_else(|| "REWARD".to_string());

        // xp_change = 0: the spend happened at purchase time, this entry
        // documents fulfilment.
        self.record_activity(
            redemption.venue_id,
            redemption.user_id,
            0,
            "Staff Verification",
            &reward_label.to_uppercase(),
        )
        .await;

        self.event_bus
            .publish(LedgerEvent::RewardFulfilled {
                venue_id: redemption.venue_id,
                user_id: redemption.user_id,
                redemption_id: redemption.redemption_id,
                reward_label,
                timestamp: now,
            })
            .await;

        info!(
            "code {} verified: venue={} user={}",
            redemption.code, redemption.venue_id, redemption.user_id
        );
        Ok(redemption)
    }

    // ----- query surface ---------------------------------------------------

    pub async fn balance(&self, user_id: Uuid, venue_id: Uuid) -> Result<i64, Error> {
        self.balance_repo.get(user_id, venue_id).await
    }

    /// Active rewards for a venue, cheapest first.
    pub async fn active_rewards(&self, venue_id: Uuid) -> Result<Vec<Reward>, Error> {
        self.reward_repo.list_active_for_venue(venue_id).await
    }

    /// A user's redemptions for a venue, most recent first.
    pub async fn redemptions_for_user(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
    ) -> Result<Vec<Redemption>, Error> {
        self.redemption_repo
            .list_for_user_venue(user_id, venue_id)
            .await
    }

    pub async fn completions_for_user(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
    ) -> Result<Vec<TaskCompletion>, Error> {
        self.completion_repo
            .list_for_user_venue(user_id, venue_id)
            .await
    }

    /// Activity feed across every venue owned by `owner_id`, newest first.
    pub async fn owner_feed(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ActivityLogEntry>, Error> {
        self.activity_repo.list_for_owner(owner_id, limit).await
    }

    /// Engagement counters derived from the owner's recent feed.
    pub async fn owner_stats(&self, owner_id: Uuid) -> Result<OwnerStats, Error> {
        let entries = self
            .activity_repo
            .list_for_owner(owner_id, STATS_FEED_LIMIT)
            .await?;

        let mut stats = OwnerStats {
            total_actions: entries.len() as u64,
            ..Default::default()
        };
        let mut users = std::collections::HashSet::new();
        for e in &entries {
            users.insert(e.user_id);
            match e.action_name.as_str() {
                "GOOGLE_REVIEW" => stats.google_reviews += 1,
                "IG_FOLLOW" => stats.ig_follows += 1,
                "QR_SCAN" => stats.check_ins += 1,
                _ => {}
            }
        }
        stats.unique_users = users.len() as u64;
        Ok(stats)
    }

    // ----- internals -------------------------------------------------------

    /// Activity-log appends are best-effort: a failed audit write is logged
    /// but never rolls back a ledger mutation that already happened.
    async fn record_activity(
        &self,
        venue_id: Uuid,
        user_id: Uuid,
        xp_change: i64,
        display_name: &str,
        action_name: &str,
    ) {
        let entry = ActivityLogEntry::new(venue_id, user_id, xp_change, display_name, action_name);
        if let Err(e) = self.activity_repo.insert(&entry).await {
            warn!("activity log append failed: {}", e);
        }
    }
}
