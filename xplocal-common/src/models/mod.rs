// File: xplocal-common/src/models/mod.rs
pub mod activity;
pub mod ledger;
pub mod redemption;
pub mod reward;
pub mod task;
pub mod user;
pub mod venue;

pub use activity::ActivityLogEntry;
pub use ledger::{ClaimOutcome, OwnerStats, TaskOutcome};
pub use redemption::{Redemption, RedemptionStatus};
pub use reward::Reward;
pub use task::{EarningTask, TaskCompletion, TaskKind};
pub use user::User;
pub use venue::{Venue, VenueStaff};
