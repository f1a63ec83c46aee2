use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A business running its own independent XP economy.
///
/// `scan_xp_amount`, `scan_cooldown_hours` and `code_expiry_days` are
/// per-venue knobs; the defaults (50 XP / 12h / 30 days) match the seeded
/// column defaults.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Venue {
    pub venue_id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub scan_xp_amount: i64,
    pub scan_cooldown_hours: i64,
    pub code_expiry_days: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Venue {
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::hours(self.scan_cooldown_hours)
    }

    pub fn code_expiry(&self) -> chrono::Duration {
        chrono::Duration::days(self.code_expiry_days)
    }
}

/// Membership row linking a staff account to a venue.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct VenueStaff {
    pub venue_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
}
