// File: xplocal-core/src/repositories/postgres/task_completions.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use xplocal_common::error::Error;
use xplocal_common::models::TaskCompletion;
use xplocal_common::traits::repository_traits::TaskCompletionRepository;

#[derive(Clone)]
pub struct PostgresTaskCompletionRepository {
    pool: Pool<Postgres>,
}

impl PostgresTaskCompletionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskCompletionRepository for PostgresTaskCompletionRepository {
    async fn insert(&self, completion: &TaskCompletion) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO task_completions (
                completion_id, user_id, venue_id, task_type, completed_at
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(completion.completion_id)
        .bind(completion.user_id)
        .bind(completion.venue_id)
        .bind(&completion.task_type)
        .bind(completion.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_if_none_since(
        &self,
        completion: &TaskCompletion,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, Error> {
        // The existence check and the insert must not interleave with a
        // concurrent claim for the same (user, venue); an advisory xact lock
        // keyed on the pair serializes them for the duration of this
        // transaction.
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text), hashtext($2::text))")
            .bind(completion.user_id)
            .bind(completion.venue_id)
            .execute(&mut *tx)
            .await?;

        let exists: bool = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM task_completions
                WHERE user_id = $1 AND venue_id = $2 AND task_type = $3
                  AND completed_at > $4
            ) AS blocked
            "#,
        )
        .bind(completion.user_id)
        .bind(completion.venue_id)
        .bind(&completion.task_type)
        .bind(cutoff)
        .fetch_one(&mut *tx)
        .await?
        .try_get("blocked")?;

        if exists {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO task_completions (
                completion_id, user_id, venue_id, task_type, completed_at
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(completion.completion_id)
        .bind(completion.user_id)
        .bind(completion.venue_id)
        .bind(&completion.task_type)
        .bind(completion.completed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn insert_once(&self, completion: &TaskCompletion) -> Result<bool, Error> {
        // Relies on the partial unique index covering one-time task types.
        let result = sqlx::query(
            r#"
            INSERT INTO task_completions (
                completion_id, user_id, venue_id, task_type, completed_at
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, venue_id, task_type)
                WHERE task_type NOT IN ('qr_scan', 'referral')
                DO NOTHING
            "#,
        )
        .bind(completion.completion_id)
        .bind(completion.user_id)
        .bind(completion.venue_id)
        .bind(&completion.task_type)
        .bind(completion.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn latest_completion(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
        task_type: &str,
    ) -> Result<Option<DateTime<Utc>>, Error> {
        let row = sqlx::query(
            r#"
            SELECT completed_at
            FROM task_completions
            WHERE user_id = $1 AND venue_id = $2 AND task_type = $3
            ORDER BY completed_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(venue_id)
        .bind(task_type)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_get("completed_at")?)),
            None => Ok(None),
        }
    }

    async fn list_for_user_venue(
        &self,
        user_id: Uuid,
        venue_id: Uuid,
    ) -> Result<Vec<TaskCompletion>, Error> {
        let rows = sqlx::query_as::<_, TaskCompletion>(
            r#"
            SELECT completion_id, user_id, venue_id, task_type, completed_at
            FROM task_completions
            WHERE user_id = $1 AND venue_id = $2
            ORDER BY completed_at DESC
            "#,
        )
        .bind(user_id)
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
