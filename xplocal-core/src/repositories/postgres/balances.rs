// File: xplocal-core/src/repositories/postgres/balances.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use xplocal_common::error::Error;
use xplocal_common::traits::repository_traits::BalanceRepository;

/// Balance mutations are single guarded statements so that concurrent
/// credits/debits serialize on the row lock and the balance can never go
/// negative (the table additionally carries a CHECK constraint).
#[derive(Clone)]
pub struct PostgresBalanceRepository {
    pool: Pool<Postgres>,
}

impl PostgresBalanceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceRepository for PostgresBalanceRepository {
    async fn get(&self, user_id: Uuid, venue_id: Uuid) -> Result<i64, Error> {
        let row = sqlx::query(
            r#"
            SELECT xp_amount FROM balances
            WHERE user_id = $1 AND venue_id = $2
            "#,
        )
        .bind(user_id)
        .bind(venue_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(r.try_get("xp_amount")?),
            None => Ok(0),
        }
    }

    async fn credit(&self, user_id: Uuid, venue_id: Uuid, amount: i64) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO balances (user_id, venue_id, xp_amount, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, venue_id) DO UPDATE
                SET xp_amount = balances.xp_amount + EXCLUDED.xp_amount,
                    updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(venue_id)
        .bind(amount)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn debit_if_sufficient(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
        amount: i64,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE balances
            SET xp_amount = xp_amount - $3, updated_at = $4
            WHERE user_id = $1 AND venue_id = $2 AND xp_amount >= $3
            "#,
        )
        .bind(user_id)
        .bind(venue_id)
        .bind(amount)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
