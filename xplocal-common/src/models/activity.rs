use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit entry for any XP-affecting event. `xp_change` is
/// positive for earns, negative for spends, and zero for staff fulfilment
/// (the spend already happened at purchase time).
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct ActivityLogEntry {
    pub log_id: Uuid,
    pub venue_id: Uuid,
    pub user_id: Uuid,
    pub xp_change: i64,
    pub display_name: String,
    pub action_name: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityLogEntry {
    pub fn new(
        venue_id: Uuid,
        user_id: Uuid,
        xp_change: i64,
        display_name: &str,
        action_name: &str,
    ) -> Self {
        Self {
            log_id: Uuid::new_v4(),
            venue_id,
            user_id,
            xp_change,
            display_name: display_name.to_string(),
            action_name: action_name.to_string(),
            created_at: Utc::now(),
        }
    }
}
