use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;
use crate::models::activity::ActivityLogEntry;
use crate::models::redemption::Redemption;
use crate::models::reward::Reward;
use crate::models::task::{EarningTask, TaskCompletion};
use crate::models::user::User;
use crate::models::venue::{Venue, VenueStaff};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<(), Error>;
    async fn get(&self, user_id: Uuid) -> Result<Option<User>, Error>;
    async fn touch_last_seen(&self, user_id: Uuid, seen_at: DateTime<Utc>) -> Result<(), Error>;
    async fn delete(&self, user_id: Uuid) -> Result<(), Error>;
}

#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn create(&self, venue: &Venue) -> Result<(), Error>;
    async fn get(&self, venue_id: Uuid) -> Result<Option<Venue>, Error>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Venue>, Error>;
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Venue>, Error>;
    async fn update_name(&self, venue_id: Uuid, name: &str) -> Result<(), Error>;
    async fn add_staff(&self, staff: &VenueStaff) -> Result<(), Error>;
    async fn list_staff(&self, venue_id: Uuid) -> Result<Vec<VenueStaff>, Error>;
}

#[async_trait]
pub trait EarningTaskRepository: Send + Sync {
    async fn create(&self, task: &EarningTask) -> Result<(), Error>;
    async fn get(&self, task_id: Uuid) -> Result<Option<EarningTask>, Error>;
    async fn find_by_type(
        &self,
        venue_id: Uuid,
        action_type: &str,
    ) -> Result<Option<EarningTask>, Error>;
    async fn list_for_venue(&self, venue_id: Uuid) -> Result<Vec<EarningTask>, Error>;
    async fn set_active(&self, task_id: Uuid, is_active: bool) -> Result<(), Error>;
    async fn update_target_url(&self, task_id: Uuid, url: Option<&str>) -> Result<(), Error>;
    async fn delete(&self, task_id: Uuid) -> Result<(), Error>;
}

#[async_trait]
pub trait TaskCompletionRepository: Send + Sync {
    /// Unconditional append (repeatable tasks such as referrals).
    async fn insert(&self, completion: &TaskCompletion) -> Result<(), Error>;

    /// Insert only if no completion of `task_type` exists for this
    /// (user, venue) with `completed_at > cutoff`. The check-and-insert is
    /// serialized per (user, venue) so concurrent claims cannot both pass.
    /// Returns whether a row was inserted.
    async fn insert_if_none_since(
        &self,
        completion: &TaskCompletion,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, Error>;

    /// Insert only if this (user, venue, task_type) has never completed
    /// before. Returns whether a row was inserted.
    async fn insert_once(&self, completion: &TaskCompletion) -> Result<bool, Error>;

    async fn latest_completion(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
        task_type: &str,
    ) -> Result<Option<DateTime<Utc>>, Error>;

    async fn list_for_user_venue(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
    ) -> Result<Vec<TaskCompletion>, Error>;
}

#[async_trait]
pub trait BalanceRepository: Send + Sync {
    async fn get(&self, user_id: Uuid, venue_id: Uuid) -> Result<i64, Error>;

    /// Adds `amount` XP, creating the balance row if absent.
    async fn credit(&self, user_id: Uuid, venue_id: Uuid, amount: i64) -> Result<(), Error>;

    /// Subtracts `amount` XP only if the current balance covers it; the
    /// check and subtraction are a single atomic step. Returns whether the
    /// debit was applied.
    async fn debit_if_sufficient(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
        amount: i64,
    ) -> Result<bool, Error>;
}

#[async_trait]
pub trait RewardRepository: Send + Sync {
    async fn create(&self, reward: &Reward) -> Result<(), Error>;
    async fn get(&self, reward_id: Uuid) -> Result<Option<Reward>, Error>;
    /// Active rewards for a venue, cheapest first.
    async fn list_active_for_venue(&self, venue_id: Uuid) -> Result<Vec<Reward>, Error>;
    async fn update(&self, reward: &Reward) -> Result<(), Error>;
    async fn delete(&self, reward_id: Uuid) -> Result<(), Error>;
}

#[async_trait]
pub trait RedemptionRepository: Send + Sync {
    /// Insert a freshly-coded redemption. Returns false when the code is
    /// already taken (the caller retries with a new code).
    async fn insert(&self, redemption: &Redemption) -> Result<bool, Error>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Redemption>, Error>;

    /// Flip status active -> inactive and stamp `redeemed_at`, but only if
    /// the row is still active. Returns whether the flip happened, making
    /// double submission race-safe.
    async fn mark_redeemed_if_active(
        &self,
        redemption_id: Uuid,
        redeemed_at: DateTime<Utc>,
    ) -> Result<bool, Error>;

    /// A user's redemptions for a venue, most recent first.
    async fn list_for_user_venue(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
    ) -> Result<Vec<Redemption>, Error>;
}

#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn insert(&self, entry: &ActivityLogEntry) -> Result<(), Error>;

    /// Feed for a single venue, most recent first.
    async fn list_for_venue(
        &self,
        venue_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ActivityLogEntry>, Error>;

    /// Feed across every venue owned by `owner_id`, most recent first.
    async fn list_for_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ActivityLogEntry>, Error>;
}
