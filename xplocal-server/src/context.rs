//! xplocal-server/src/context.rs
//!
//! The main "global" context (ServerContext) for the ledger server.

use std::sync::Arc;

use tracing::info;

use xplocal_core::db::Database;
use xplocal_core::eventbus::EventBus;
use xplocal_core::repositories::postgres::{
    PostgresActivityLogRepository, PostgresBalanceRepository, PostgresEarningTaskRepository,
    PostgresRedemptionRepository, PostgresRewardRepository, PostgresTaskCompletionRepository,
    PostgresUserRepository, PostgresVenueRepository,
};
use xplocal_core::services::{LedgerService, VenueService};
use xplocal_core::Error;

use crate::Args;

/// Bag of references handed to every request handler.
#[derive(Clone)]
pub struct ServerContext {
    pub db: Database,
    pub event_bus: Arc<EventBus>,
    pub ledger: Arc<LedgerService>,
    pub venues: Arc<VenueService>,
    pub user_repo: Arc<PostgresUserRepository>,
}

impl ServerContext {
    /// Creates and configures the entire context for server mode.
    pub async fn new(args: &Args) -> Result<Self, Error> {
        let db = Database::new(&args.db_url).await?;
        db.migrate().await?;

        let event_bus = Arc::new(EventBus::new());

        let venue_repo = Arc::new(PostgresVenueRepository::new(db.pool().clone()));
        let task_repo = Arc::new(PostgresEarningTaskRepository::new(db.pool().clone()));
        let completion_repo = Arc::new(PostgresTaskCompletionRepository::new(db.pool().clone()));
        let balance_repo = Arc::new(PostgresBalanceRepository::new(db.pool().clone()));
        let reward_repo = Arc::new(PostgresRewardRepository::new(db.pool().clone()));
        let redemption_repo = Arc::new(PostgresRedemptionRepository::new(db.pool().clone()));
        let activity_repo = Arc::new(PostgresActivityLogRepository::new(db.pool().clone()));
        let user_repo = Arc::new(PostgresUserRepository::new(db.pool().clone()));

        let ledger = Arc::new(LedgerService::new(
            venue_repo.clone(),
            task_repo.clone(),
            completion_repo,
            balance_repo,
            reward_repo.clone(),
            redemption_repo,
            activity_repo,
            event_bus.clone(),
        ));

        let venues = Arc::new(VenueService::new(venue_repo, task_repo, reward_repo));

        info!("Server context initialized");
        Ok(Self {
            db,
            event_bus,
            ledger,
            venues,
            user_repo,
        })
    }
}
