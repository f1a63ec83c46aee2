use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of a redemption claim code: 6 uppercase base-36 characters.
pub const CLAIM_CODE_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Active,
    Inactive,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::Active => "active",
            RedemptionStatus::Inactive => "inactive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(RedemptionStatus::Active),
            "inactive" => Some(RedemptionStatus::Inactive),
            _ => None,
        }
    }
}

/// A purchased-but-not-yet-fulfilled reward claim, represented by a
/// single-use code. Flips to `inactive` exactly once, on staff verification.
/// Expired-but-unused codes stay `active` so they remain distinguishable
/// from used ones.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Redemption {
    pub redemption_id: Uuid,
    pub user_id: Uuid,
    pub venue_id: Uuid,
    pub reward_id: Uuid,
    pub code: String,
    pub status: RedemptionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl Redemption {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
