// File: xplocal-core/src/repositories/postgres/redemptions.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use xplocal_common::error::Error;
use xplocal_common::models::{Redemption, RedemptionStatus};
use xplocal_common::traits::repository_traits::RedemptionRepository;

#[derive(Clone)]
pub struct PostgresRedemptionRepository {
    pool: Pool<Postgres>,
}

impl PostgresRedemptionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn from_row(r: &PgRow) -> Result<Redemption, Error> {
        let status_str: String = r.try_get("status")?;
        let status = RedemptionStatus::from_str(&status_str)
            .ok_or_else(|| Error::Parse(format!("unknown redemption status '{}'", status_str)))?;

        Ok(Redemption {
            redemption_id: r.try_get("redemption_id")?,
            user_id: r.try_get("user_id")?,
            venue_id: r.try_get("venue_id")?,
            reward_id: r.try_get("reward_id")?,
            code: r.try_get("code")?,
            status,
            created_at: r.try_get("created_at")?,
            expires_at: r.try_get("expires_at")?,
            redeemed_at: r.try_get("redeemed_at")?,
        })
    }
}

#[async_trait]
impl RedemptionRepository for PostgresRedemptionRepository {
    async fn insert(&self, redemption: &Redemption) -> Result<bool, Error> {
        // A code collision is not an error; the caller re-rolls the code.
        let result = sqlx::query(
            r#"
            INSERT INTO redemptions (
                redemption_id, user_id, venue_id, reward_id,
                code, status, created_at, expires_at, redeemed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(redemption.redemption_id)
        .bind(redemption.user_id)
        .bind(redemption.venue_id)
        .bind(redemption.reward_id)
        .bind(&redemption.code)
        .bind(redemption.status.as_str())
        .bind(redemption.created_at)
        .bind(redemption.expires_at)
        .bind(redemption.redeemed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Redemption>, Error> {
        let row = sqlx::query(
            r#"
            SELECT redemption_id, user_id, venue_id, reward_id,
                   code, status, created_at, expires_at, redeemed_at
            FROM redemptions
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::from_row(&r)?)),
            None => Ok(None),
        }
    }

    async fn mark_redeemed_if_active(
        &self,
        redemption_id: Uuid,
        redeemed_at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE redemptions
            SET status = 'inactive', redeemed_at = $2
            WHERE redemption_id = $1 AND status = 'active'
            "#,
        )
        .bind(redemption_id)
        .bind(redeemed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user_venue(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
    ) -> Result<Vec<Redemption>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT redemption_id, user_id, venue_id, reward_id,
                   code, status, created_at, expires_at, redeemed_at
            FROM redemptions
            WHERE user_id = $1 AND venue_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::from_row).collect()
    }
}
