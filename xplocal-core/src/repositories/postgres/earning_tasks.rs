// File: xplocal-core/src/repositories/postgres/earning_tasks.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use xplocal_common::error::Error;
use xplocal_common::models::EarningTask;
use xplocal_common::traits::repository_traits::EarningTaskRepository;

#[derive(Clone)]
pub struct PostgresEarningTaskRepository {
    pool: Pool<Postgres>,
}

impl PostgresEarningTaskRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EarningTaskRepository for PostgresEarningTaskRepository {
    async fn create(&self, task: &EarningTask) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO earning_tasks (
                task_id, venue_id, action_type, label,
                xp_amount, target_url, is_active,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(task.task_id)
        .bind(task.venue_id)
        .bind(&task.action_type)
        .bind(&task.label)
        .bind(task.xp_amount)
        .bind(&task.target_url)
        .bind(task.is_active)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, task_id: Uuid) -> Result<Option<EarningTask>, Error> {
        let row = sqlx::query_as::<_, EarningTask>(
            r#"
            SELECT task_id, venue_id, action_type, label,
                   xp_amount, target_url, is_active, created_at, updated_at
            FROM earning_tasks
            WHERE task_id = $1
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_type(
        &self,
        venue_id: Uuid,
        action_type: &str,
    ) -> Result<Option<EarningTask>, Error> {
        let row = sqlx::query_as::<_, EarningTask>(
            r#"
            SELECT task_id, venue_id, action_type, label,
                   xp_amount, target_url, is_active, created_at, updated_at
            FROM earning_tasks
            WHERE venue_id = $1 AND action_type = $2
            "#,
        )
        .bind(venue_id)
        .bind(action_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_for_venue(&self, venue_id: Uuid) -> Result<Vec<EarningTask>, Error> {
        let rows = sqlx::query_as::<_, EarningTask>(
            r#"
            SELECT task_id, venue_id, action_type, label,
                   xp_amount, target_url, is_active, created_at, updated_at
            FROM earning_tasks
            WHERE venue_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn set_active(&self, task_id: Uuid, is_active: bool) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE earning_tasks
            SET is_active = $2, updated_at = $3
            WHERE task_id = $1
            "#,
        )
        .bind(task_id)
        .bind(is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_target_url(&self, task_id: Uuid, url: Option<&str>) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE earning_tasks
            SET target_url = $2, updated_at = $3
            WHERE task_id = $1
            "#,
        )
        .bind(task_id)
        .bind(url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, task_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM earning_tasks WHERE task_id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
