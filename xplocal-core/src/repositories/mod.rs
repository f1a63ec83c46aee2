// src/repositories/mod.rs

pub mod postgres;

pub use postgres::{
    PostgresActivityLogRepository, PostgresBalanceRepository, PostgresEarningTaskRepository,
    PostgresRedemptionRepository, PostgresRewardRepository, PostgresTaskCompletionRepository,
    PostgresUserRepository, PostgresVenueRepository,
};
