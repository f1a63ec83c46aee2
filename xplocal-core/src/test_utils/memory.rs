// File: xplocal-core/src/test_utils/memory.rs
//
// In-memory implementations of every repository trait, mirroring the
// atomicity semantics of the Postgres versions (all checks and mutations
// happen under one lock). Used to exercise ledger invariants without a
// database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use xplocal_common::error::Error;
use xplocal_common::models::{
    ActivityLogEntry, Redemption, RedemptionStatus, Reward, TaskCompletion, User, Venue,
    VenueStaff,
};
use xplocal_common::models::task::EarningTask;
use xplocal_common::traits::repository_traits::{
    ActivityLogRepository, BalanceRepository, EarningTaskRepository, RedemptionRepository,
    RewardRepository, TaskCompletionRepository, UserRepository, VenueRepository,
};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    venues: HashMap<Uuid, Venue>,
    staff: Vec<VenueStaff>,
    tasks: HashMap<Uuid, EarningTask>,
    completions: Vec<TaskCompletion>,
    balances: HashMap<(Uuid, Uuid), i64>,
    rewards: HashMap<Uuid, Reward>,
    redemptions: HashMap<Uuid, Redemption>,
    activity: Vec<ActivityLogEntry>,
}

/// One shared store standing in for the whole schema.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> Result<(), Error> {
        self.inner.lock().users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<User>, Error> {
        Ok(self.inner.lock().users.get(&user_id).cloned())
    }

    async fn touch_last_seen(&self, user_id: Uuid, seen_at: DateTime<Utc>) -> Result<(), Error> {
        if let Some(u) = self.inner.lock().users.get_mut(&user_id) {
            u.last_seen = seen_at;
        }
        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), Error> {
        self.inner.lock().users.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl VenueRepository for MemoryStore {
    async fn create(&self, venue: &Venue) -> Result<(), Error> {
        self.inner.lock().venues.insert(venue.venue_id, venue.clone());
        Ok(())
    }

    async fn get(&self, venue_id: Uuid) -> Result<Option<Venue>, Error> {
        Ok(self.inner.lock().venues.get(&venue_id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Venue>, Error> {
        Ok(self
            .inner
            .lock()
            .venues
            .values()
            .find(|v| v.slug == slug)
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Venue>, Error> {
        let mut venues: Vec<Venue> = self
            .inner
            .lock()
            .venues
            .values()
            .filter(|v| v.owner_id == owner_id)
            .cloned()
            .collect();
        venues.sort_by_key(|v| v.created_at);
        Ok(venues)
    }

    async fn update_name(&self, venue_id: Uuid, name: &str) -> Result<(), Error> {
        if let Some(v) = self.inner.lock().venues.get_mut(&venue_id) {
            v.name = name.to_string();
            v.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn add_staff(&self, staff: &VenueStaff) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        inner
            .staff
            .retain(|s| !(s.venue_id == staff.venue_id && s.user_id == staff.user_id));
        inner.staff.push(staff.clone());
        Ok(())
    }

    async fn list_staff(&self, venue_id: Uuid) -> Result<Vec<VenueStaff>, Error> {
        Ok(self
            .inner
            .lock()
            .staff
            .iter()
            .filter(|s| s.venue_id == venue_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EarningTaskRepository for MemoryStore {
    async fn create(&self, task: &EarningTask) -> Result<(), Error> {
        self.inner.lock().tasks.insert(task.task_id, task.clone());
        Ok(())
    }

    async fn get(&self, task_id: Uuid) -> Result<Option<EarningTask>, Error> {
        Ok(self.inner.lock().tasks.get(&task_id).cloned())
    }

    async fn find_by_type(
        &self,
        venue_id: Uuid,
        action_type: &str,
    ) -> Result<Option<EarningTask>, Error> {
        Ok(self
            .inner
            .lock()
            .tasks
            .values()
            .find(|t| t.venue_id == venue_id && t.action_type == action_type)
            .cloned())
    }

    async fn list_for_venue(&self, venue_id: Uuid) -> Result<Vec<EarningTask>, Error> {
        let mut tasks: Vec<EarningTask> = self
            .inner
            .lock()
            .tasks
            .values()
            .filter(|t| t.venue_id == venue_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }

    async fn set_active(&self, task_id: Uuid, is_active: bool) -> Result<(), Error> {
        if let Some(t) = self.inner.lock().tasks.get_mut(&task_id) {
            t.is_active = is_active;
            t.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_target_url(&self, task_id: Uuid, url: Option<&str>) -> Result<(), Error> {
        if let Some(t) = self.inner.lock().tasks.get_mut(&task_id) {
            t.target_url = url.map(String::from);
            t.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, task_id: Uuid) -> Result<(), Error> {
        self.inner.lock().tasks.remove(&task_id);
        Ok(())
    }
}

#[async_trait]
impl TaskCompletionRepository for MemoryStore {
    async fn insert(&self, completion: &TaskCompletion) -> Result<(), Error> {
        self.inner.lock().completions.push(completion.clone());
        Ok(())
    }

    async fn insert_if_none_since(
        &self,
        completion: &TaskCompletion,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let mut inner = self.inner.lock();
        let blocked = inner.completions.iter().any(|c| {
            c.user_id == completion.user_id
                && c.venue_id == completion.venue_id
                && c.task_type == completion.task_type
                && c.completed_at > cutoff
        });
        if blocked {
            return Ok(false);
        }
        inner.completions.push(completion.clone());
        Ok(true)
    }

    async fn insert_once(&self, completion: &TaskCompletion) -> Result<bool, Error> {
        let mut inner = self.inner.lock();
        let exists = inner.completions.iter().any(|c| {
            c.user_id == completion.user_id
                && c.venue_id == completion.venue_id
                && c.task_type == completion.task_type
        });
        if exists {
            return Ok(false);
        }
        inner.completions.push(completion.clone());
        Ok(true)
    }

    async fn latest_completion(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
        task_type: &str,
    ) -> Result<Option<DateTime<Utc>>, Error> {
        Ok(self
            .inner
            .lock()
            .completions
            .iter()
            .filter(|c| c.user_id == user_id && c.venue_id == venue_id && c.task_type == task_type)
            .map(|c| c.completed_at)
            .max())
    }

    async fn list_for_user_venue(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
    ) -> Result<Vec<TaskCompletion>, Error> {
        let mut completions: Vec<TaskCompletion> = self
            .inner
            .lock()
            .completions
            .iter()
            .filter(|c| c.user_id == user_id && c.venue_id == venue_id)
            .cloned()
            .collect();
        completions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(completions)
    }
}

#[async_trait]
impl BalanceRepository for MemoryStore {
    async fn get(&self, user_id: Uuid, venue_id: Uuid) -> Result<i64, Error> {
        Ok(*self
            .inner
            .lock()
            .balances
            .get(&(user_id, venue_id))
            .unwrap_or(&0))
    }

    async fn credit(&self, user_id: Uuid, venue_id: Uuid, amount: i64) -> Result<(), Error> {
        *self
            .inner
            .lock()
            .balances
            .entry((user_id, venue_id))
            .or_insert(0) += amount;
        Ok(())
    }

    async fn debit_if_sufficient(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
        amount: i64,
    ) -> Result<bool, Error> {
        let mut inner = self.inner.lock();
        let balance = inner.balances.entry((user_id, venue_id)).or_insert(0);
        if *balance < amount {
            return Ok(false);
        }
        *balance -= amount;
        Ok(true)
    }
}

#[async_trait]
impl RewardRepository for MemoryStore {
    async fn create(&self, reward: &Reward) -> Result<(), Error> {
        self.inner.lock().rewards.insert(reward.reward_id, reward.clone());
        Ok(())
    }

    async fn get(&self, reward_id: Uuid) -> Result<Option<Reward>, Error> {
        Ok(self.inner.lock().rewards.get(&reward_id).cloned())
    }

    async fn list_active_for_venue(&self, venue_id: Uuid) -> Result<Vec<Reward>, Error> {
        let mut rewards: Vec<Reward> = self
            .inner
            .lock()
            .rewards
            .values()
            .filter(|r| r.venue_id == venue_id && r.is_active)
            .cloned()
            .collect();
        rewards.sort_by_key(|r| r.cost);
        Ok(rewards)
    }

    async fn update(&self, reward: &Reward) -> Result<(), Error> {
        self.inner.lock().rewards.insert(reward.reward_id, reward.clone());
        Ok(())
    }

    async fn delete(&self, reward_id: Uuid) -> Result<(), Error> {
        self.inner.lock().rewards.remove(&reward_id);
        Ok(())
    }
}

#[async_trait]
impl RedemptionRepository for MemoryStore {
    async fn insert(&self, redemption: &Redemption) -> Result<bool, Error> {
        let mut inner = self.inner.lock();
        if inner.redemptions.values().any(|r| r.code == redemption.code) {
            return Ok(false);
        }
        inner
            .redemptions
            .insert(redemption.redemption_id, redemption.clone());
        Ok(true)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Redemption>, Error> {
        Ok(self
            .inner
            .lock()
            .redemptions
            .values()
            .find(|r| r.code == code)
            .cloned())
    }

    async fn mark_redeemed_if_active(
        &self,
        redemption_id: Uuid,
        redeemed_at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let mut inner = self.inner.lock();
        match inner.redemptions.get_mut(&redemption_id) {
            Some(r) if r.status == RedemptionStatus::Active => {
                r.status = RedemptionStatus::Inactive;
                r.redeemed_at = Some(redeemed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_for_user_venue(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
    ) -> Result<Vec<Redemption>, Error> {
        let mut redemptions: Vec<Redemption> = self
            .inner
            .lock()
            .redemptions
            .values()
            .filter(|r| r.user_id == user_id && r.venue_id == venue_id)
            .cloned()
            .collect();
        redemptions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(redemptions)
    }
}

#[async_trait]
impl ActivityLogRepository for MemoryStore {
    async fn insert(&self, entry: &ActivityLogEntry) -> Result<(), Error> {
        self.inner.lock().activity.push(entry.clone());
        Ok(())
    }

    async fn list_for_venue(
        &self,
        venue_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ActivityLogEntry>, Error> {
        let mut entries: Vec<ActivityLogEntry> = self
            .inner
            .lock()
            .activity
            .iter()
            .filter(|e| e.venue_id == venue_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit as usize);
        Ok(entries)
    }

    async fn list_for_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ActivityLogEntry>, Error> {
        let inner = self.inner.lock();
        let owned: Vec<Uuid> = inner
            .venues
            .values()
            .filter(|v| v.owner_id == owner_id)
            .map(|v| v.venue_id)
            .collect();
        let mut entries: Vec<ActivityLogEntry> = inner
            .activity
            .iter()
            .filter(|e| owned.contains(&e.venue_id))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit as usize);
        Ok(entries)
    }
}
