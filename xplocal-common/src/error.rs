// ================================================================
// File: xplocal-common/src/error.rs
// ================================================================

use thiserror::Error;

/// Infrastructure-level errors. Business-rule rejections (insufficient
/// balance, expired code, ...) are NOT represented here; they live in the
/// typed failure enums below so the HTTP layer can keep them distinct.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

/// Why a reward purchase was refused (or failed outright).
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("Reward does not exist for this venue.")]
    RewardNotFound,

    #[error("Insufficient XP balance.")]
    InsufficientBalance,

    #[error(transparent)]
    Internal(#[from] Error),
}

/// Why a staff code verification was refused (or failed outright).
#[derive(Debug, Error)]
pub enum RedeemError {
    #[error("Code does not exist.")]
    NotFound,

    #[error("Code already used or deactivated.")]
    AlreadyUsed,

    #[error("Code has expired.")]
    Expired,

    #[error("Code belongs to a venue not owned by this staff account.")]
    NotOwnedByStaffVenue,

    #[error(transparent)]
    Internal(#[from] Error),
}

/// Why an earning-task completion was refused (or failed outright).
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Venue does not exist.")]
    VenueNotFound,

    #[error("No such earning task for this venue.")]
    TaskNotFound,

    #[error("This earning task is currently disabled.")]
    TaskInactive,

    #[error("The recurring check-in task is claimed through the scan flow.")]
    NotOneTime,

    #[error("The recurring check-in task cannot be disabled or removed.")]
    RecurringLocked,

    #[error(transparent)]
    Internal(#[from] Error),
}
