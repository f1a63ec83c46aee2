// src/repositories/postgres/mod.rs

pub mod activity_log;
pub mod balances;
pub mod earning_tasks;
pub mod redemptions;
pub mod rewards;
pub mod task_completions;
pub mod users;
pub mod venues;

pub use activity_log::PostgresActivityLogRepository;
pub use balances::PostgresBalanceRepository;
pub use earning_tasks::PostgresEarningTaskRepository;
pub use redemptions::PostgresRedemptionRepository;
pub use rewards::PostgresRewardRepository;
pub use task_completions::PostgresTaskCompletionRepository;
pub use users::PostgresUserRepository;
pub use venues::PostgresVenueRepository;
