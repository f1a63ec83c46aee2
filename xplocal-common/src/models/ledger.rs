use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a recurring check-in claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub credited: bool,
    pub amount: i64,
    /// When the user may claim again. Set on both outcomes: after a credit it
    /// is `now + cooldown`, on a cooldown rejection it is
    /// `last_completion + cooldown`.
    pub next_eligible_at: Option<DateTime<Utc>>,
}

/// Result of a one-time (or referral) task completion attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub credited: bool,
    pub amount: i64,
}

/// Aggregate engagement counters for an owner's venues, derived from the
/// activity feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnerStats {
    pub total_actions: u64,
    pub unique_users: u64,
    pub google_reviews: u64,
    pub ig_follows: u64,
    pub check_ins: u64,
}
