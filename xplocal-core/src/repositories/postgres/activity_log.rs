// File: xplocal-core/src/repositories/postgres/activity_log.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use xplocal_common::error::Error;
use xplocal_common::models::ActivityLogEntry;
use xplocal_common::traits::repository_traits::ActivityLogRepository;

#[derive(Clone)]
pub struct PostgresActivityLogRepository {
    pool: Pool<Postgres>,
}

impl PostgresActivityLogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PostgresActivityLogRepository {
    async fn insert(&self, entry: &ActivityLogEntry) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (
                log_id, venue_id, user_id, xp_change,
                display_name, action_name, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.log_id)
        .bind(entry.venue_id)
        .bind(entry.user_id)
        .bind(entry.xp_change)
        .bind(&entry.display_name)
        .bind(&entry.action_name)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_venue(
        &self,
        venue_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ActivityLogEntry>, Error> {
        let rows = sqlx::query_as::<_, ActivityLogEntry>(
            r#"
            SELECT log_id, venue_id, user_id, xp_change,
                   display_name, action_name, created_at
            FROM activity_logs
            WHERE venue_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(venue_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_for_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ActivityLogEntry>, Error> {
        let rows = sqlx::query_as::<_, ActivityLogEntry>(
            r#"
            SELECT a.log_id, a.venue_id, a.user_id, a.xp_change,
                   a.display_name, a.action_name, a.created_at
            FROM activity_logs a
            JOIN venues v ON v.venue_id = a.venue_id
            WHERE v.owner_id = $1
            ORDER BY a.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
