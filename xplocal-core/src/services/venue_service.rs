use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use xplocal_common::error::{Error, TaskError};
use xplocal_common::models::{EarningTask, Reward, TaskKind, Venue, VenueStaff};
use xplocal_common::traits::repository_traits::{
    EarningTaskRepository, RewardRepository, VenueRepository,
};

/// Spec for one seeded earning task at onboarding time.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub kind: TaskKind,
    pub target_url: Option<String>,
}

/// Spec for one seeded catalog reward at onboarding time.
#[derive(Debug, Clone)]
pub struct RewardSpec {
    pub label: String,
    pub cost: i64,
}

/// Owner-facing venue management: onboarding, task toggles, reward catalog.
/// The recurring check-in task is special-cased throughout: it is always
/// seeded, always active, and can neither be disabled nor deleted.
pub struct VenueService {
    venue_repo: Arc<dyn VenueRepository>,
    task_repo: Arc<dyn EarningTaskRepository>,
    reward_repo: Arc<dyn RewardRepository>,
}

impl VenueService {
    pub fn new(
        venue_repo: Arc<dyn VenueRepository>,
        task_repo: Arc<dyn EarningTaskRepository>,
        reward_repo: Arc<dyn RewardRepository>,
    ) -> Self {
        Self {
            venue_repo,
            task_repo,
            reward_repo,
        }
    }

    /// Onboard a new venue: create it under a unique slug, register the
    /// owner as admin staff, seed the selected earning tasks (the recurring
    /// task is always included) and the initial reward catalog.
    pub async fn create_venue(
        &self,
        owner_id: Uuid,
        name: &str,
        tasks: &[TaskSpec],
        rewards: &[RewardSpec],
    ) -> Result<Venue, Error> {
        let now = Utc::now();
        let venue = Venue {
            venue_id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            slug: slugify_with_suffix(name),
            scan_xp_amount: TaskKind::Recurring.default_xp(),
            scan_cooldown_hours: 12,
            code_expiry_days: 30,
            created_at: now,
            updated_at: now,
        };
        self.venue_repo.create(&venue).await?;

        self.venue_repo
            .add_staff(&VenueStaff {
                venue_id: venue.venue_id,
                user_id: owner_id,
                role: "admin".to_string(),
            })
            .await?;

        // earning_tasks is UNIQUE on (venue_id, action_type); repeated kinds
        // in the input collapse to their first occurrence.
        let mut kinds: Vec<TaskSpec> = vec![TaskSpec {
            kind: TaskKind::Recurring,
            target_url: None,
        }];
        for spec in tasks {
            if !kinds.iter().any(|k| k.kind == spec.kind) {
                kinds.push(spec.clone());
            }
        }

        for spec in &kinds {
            let task = EarningTask {
                task_id: Uuid::new_v4(),
                venue_id: venue.venue_id,
                action_type: spec.kind.as_str().to_string(),
                label: spec.kind.default_label().to_string(),
                xp_amount: spec.kind.default_xp(),
                target_url: spec.target_url.clone(),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            self.task_repo.create(&task).await?;
        }

        for spec in rewards {
            let reward = Reward::new(venue.venue_id, &spec.label, spec.cost);
            self.reward_repo.create(&reward).await?;
        }

        info!(
            "venue '{}' launched: {} tasks, {} rewards",
            venue.slug,
            kinds.len(),
            rewards.len()
        );
        Ok(venue)
    }

    pub async fn get_venue(&self, venue_id: Uuid) -> Result<Option<Venue>, Error> {
        self.venue_repo.get(venue_id).await
    }

    pub async fn venues_for_owner(&self, owner_id: Uuid) -> Result<Vec<Venue>, Error> {
        self.venue_repo.list_by_owner(owner_id).await
    }

    pub async fn rename_venue(&self, venue_id: Uuid, name: &str) -> Result<(), Error> {
        self.venue_repo.update_name(venue_id, name).await
    }

    pub async fn tasks_for_venue(&self, venue_id: Uuid) -> Result<Vec<EarningTask>, Error> {
        self.task_repo.list_for_venue(venue_id).await
    }

    /// Toggle an earning task on/off. Refused for the recurring task.
    pub async fn set_task_active(
        &self,
        task_id: Uuid,
        is_active: bool,
    ) -> Result<(), TaskError> {
        let task = self
            .task_repo
            .get(task_id)
            .await?
            .ok_or(TaskError::TaskNotFound)?;
        if task.kind() == Some(TaskKind::Recurring) {
            return Err(TaskError::RecurringLocked);
        }
        self.task_repo.set_active(task_id, is_active).await?;
        Ok(())
    }

    pub async fn set_task_target_url(
        &self,
        task_id: Uuid,
        url: Option<&str>,
    ) -> Result<(), TaskError> {
        self.task_repo
            .get(task_id)
            .await?
            .ok_or(TaskError::TaskNotFound)?;
        self.task_repo.update_target_url(task_id, url).await?;
        Ok(())
    }

    pub async fn delete_task(&self, task_id: Uuid) -> Result<(), TaskError> {
        let task = self
            .task_repo
            .get(task_id)
            .await?
            .ok_or(TaskError::TaskNotFound)?;
        if task.kind() == Some(TaskKind::Recurring) {
            return Err(TaskError::RecurringLocked);
        }
        self.task_repo.delete(task_id).await?;
        Ok(())
    }

    pub async fn get_reward(&self, reward_id: Uuid) -> Result<Option<Reward>, Error> {
        self.reward_repo.get(reward_id).await
    }

    pub async fn create_reward(
        &self,
        venue_id: Uuid,
        label: &str,
        cost: i64,
    ) -> Result<Reward, Error> {
        let reward = Reward::new(venue_id, label, cost);
        self.reward_repo.create(&reward).await?;
        Ok(reward)
    }

    pub async fn update_reward(&self, reward: &Reward) -> Result<(), Error> {
        self.reward_repo.update(reward).await
    }

    pub async fn delete_reward(&self, reward_id: Uuid) -> Result<(), Error> {
        self.reward_repo.delete(reward_id).await
    }
}

/// Lowercased, dash-separated slug with a random 4-char base-36 suffix to
/// dodge collisions between venues with the same name.
fn slugify_with_suffix(name: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let trimmed = slug.trim_end_matches('-');

    let mut rng = rand::rng();
    let alphabet = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let suffix: String = (0..4)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect();

    format!("{}-{}", trimmed, suffix)
}
