// File: xplocal-core/src/repositories/postgres/rewards.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use xplocal_common::error::Error;
use xplocal_common::models::Reward;
use xplocal_common::traits::repository_traits::RewardRepository;

#[derive(Clone)]
pub struct PostgresRewardRepository {
    pool: Pool<Postgres>,
}

impl PostgresRewardRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RewardRepository for PostgresRewardRepository {
    async fn create(&self, reward: &Reward) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO rewards (
                reward_id, venue_id, label, cost, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(reward.reward_id)
        .bind(reward.venue_id)
        .bind(&reward.label)
        .bind(reward.cost)
        .bind(reward.is_active)
        .bind(reward.created_at)
        .bind(reward.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, reward_id: Uuid) -> Result<Option<Reward>, Error> {
        let row = sqlx::query_as::<_, Reward>(
            r#"
            SELECT reward_id, venue_id, label, cost, is_active, created_at, updated_at
            FROM rewards
            WHERE reward_id = $1
            "#,
        )
        .bind(reward_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_active_for_venue(&self, venue_id: Uuid) -> Result<Vec<Reward>, Error> {
        let rows = sqlx::query_as::<_, Reward>(
            r#"
            SELECT reward_id, venue_id, label, cost, is_active, created_at, updated_at
            FROM rewards
            WHERE venue_id = $1 AND is_active = TRUE
            ORDER BY cost ASC
            "#,
        )
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn update(&self, reward: &Reward) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE rewards
            SET label = $2, cost = $3, is_active = $4, updated_at = $5
            WHERE reward_id = $1
            "#,
        )
        .bind(reward.reward_id)
        .bind(&reward.label)
        .bind(reward.cost)
        .bind(reward.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, reward_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM rewards WHERE reward_id = $1")
            .bind(reward_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
