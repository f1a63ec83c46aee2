// File: xplocal-core/src/repositories/postgres/users.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use xplocal_common::error::Error;
use xplocal_common::models::User;
use xplocal_common::traits::repository_traits::UserRepository;

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: Pool<Postgres>,
}

impl PostgresUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, display_name, created_at, last_seen, is_active)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.display_name)
        .bind(user.created_at)
        .bind(user.last_seen)
        .bind(user.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, display_name, created_at, last_seen, is_active
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn touch_last_seen(&self, user_id: Uuid, seen_at: DateTime<Utc>) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE users SET last_seen = $2 WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(seen_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
