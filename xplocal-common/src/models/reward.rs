use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A venue-scoped catalog item purchasable with XP.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Reward {
    pub reward_id: Uuid,
    pub venue_id: Uuid,
    pub label: String,
    pub cost: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    pub fn new(venue_id: Uuid, label: &str, cost: i64) -> Self {
        let now = Utc::now();
        Self {
            reward_id: Uuid::new_v4(),
            venue_id,
            label: label.to_string(),
            cost,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
