use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The defined earning actions a venue can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// The QR check-in task. Always active, never deletable, and gated by
    /// the venue's rolling cooldown rather than a once-ever rule.
    Recurring,
    GoogleReview,
    IgFollow,
    SmsSignup,
    Referral,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Recurring => "recurring",
            TaskKind::GoogleReview => "google_review",
            TaskKind::IgFollow => "ig_follow",
            TaskKind::SmsSignup => "sms_signup",
            TaskKind::Referral => "referral",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "recurring" => Some(TaskKind::Recurring),
            "google_review" => Some(TaskKind::GoogleReview),
            "ig_follow" => Some(TaskKind::IgFollow),
            "sms_signup" => Some(TaskKind::SmsSignup),
            "referral" => Some(TaskKind::Referral),
            _ => None,
        }
    }

    /// Tag written into `task_completions.task_type`. The recurring task is
    /// recorded as `qr_scan`; all other kinds use their own action type.
    pub fn completion_tag(&self) -> &'static str {
        match self {
            TaskKind::Recurring => "qr_scan",
            other => other.as_str(),
        }
    }

    /// One-time tasks may be completed at most once ever per (user, venue).
    /// Referrals re-credit on each completion.
    pub fn is_one_time(&self) -> bool {
        matches!(
            self,
            TaskKind::GoogleReview | TaskKind::IgFollow | TaskKind::SmsSignup
        )
    }

    /// Seeded XP values used during venue onboarding.
    pub fn default_xp(&self) -> i64 {
        match self {
            TaskKind::Recurring => 50,
            TaskKind::GoogleReview => 100,
            TaskKind::IgFollow => 25,
            TaskKind::SmsSignup => 25,
            TaskKind::Referral => 50,
        }
    }

    pub fn default_label(&self) -> &'static str {
        match self {
            TaskKind::Recurring => "Recurring Visits",
            TaskKind::GoogleReview => "Google Review",
            TaskKind::IgFollow => "IG Follow",
            TaskKind::SmsSignup => "SMS Club Sign-up",
            TaskKind::Referral => "Referral Program",
        }
    }
}

/// A venue-scoped earning action definition.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct EarningTask {
    pub task_id: Uuid,
    pub venue_id: Uuid,
    pub action_type: String,
    pub label: String,
    pub xp_amount: i64,
    pub target_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EarningTask {
    pub fn kind(&self) -> Option<TaskKind> {
        TaskKind::from_str(&self.action_type)
    }
}

/// Append-only record of a completed earning action. Each completion is a
/// ledger entry, never a mutable status flag.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct TaskCompletion {
    pub completion_id: Uuid,
    pub user_id: Uuid,
    pub venue_id: Uuid,
    pub task_type: String,
    pub completed_at: DateTime<Utc>,
}
