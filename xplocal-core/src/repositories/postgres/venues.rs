// File: xplocal-core/src/repositories/postgres/venues.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use xplocal_common::error::Error;
use xplocal_common::models::{Venue, VenueStaff};
use xplocal_common::traits::repository_traits::VenueRepository;

#[derive(Clone)]
pub struct PostgresVenueRepository {
    pool: Pool<Postgres>,
}

impl PostgresVenueRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VenueRepository for PostgresVenueRepository {
    async fn create(&self, venue: &Venue) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO venues (
                venue_id, owner_id, name, slug,
                scan_xp_amount, scan_cooldown_hours, code_expiry_days,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(venue.venue_id)
        .bind(venue.owner_id)
        .bind(&venue.name)
        .bind(&venue.slug)
        .bind(venue.scan_xp_amount)
        .bind(venue.scan_cooldown_hours)
        .bind(venue.code_expiry_days)
        .bind(venue.created_at)
        .bind(venue.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, venue_id: Uuid) -> Result<Option<Venue>, Error> {
        let row = sqlx::query_as::<_, Venue>(
            r#"
            SELECT venue_id, owner_id, name, slug,
                   scan_xp_amount, scan_cooldown_hours, code_expiry_days,
                   created_at, updated_at
            FROM venues
            WHERE venue_id = $1
            "#,
        )
        .bind(venue_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Venue>, Error> {
        let row = sqlx::query_as::<_, Venue>(
            r#"
            SELECT venue_id, owner_id, name, slug,
                   scan_xp_amount, scan_cooldown_hours, code_expiry_days,
                   created_at, updated_at
            FROM venues
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Venue>, Error> {
        let rows = sqlx::query_as::<_, Venue>(
            r#"
            SELECT venue_id, owner_id, name, slug,
                   scan_xp_amount, scan_cooldown_hours, code_expiry_days,
                   created_at, updated_at
            FROM venues
            WHERE owner_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn update_name(&self, venue_id: Uuid, name: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE venues SET name = $2, updated_at = $3 WHERE venue_id = $1
            "#,
        )
        .bind(venue_id)
        .bind(name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn add_staff(&self, staff: &VenueStaff) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO venue_staff (venue_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (venue_id, user_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(staff.venue_id)
        .bind(staff.user_id)
        .bind(&staff.role)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_staff(&self, venue_id: Uuid) -> Result<Vec<VenueStaff>, Error> {
        let rows = sqlx::query_as::<_, VenueStaff>(
            r#"
            SELECT venue_id, user_id, role
            FROM venue_staff
            WHERE venue_id = $1
            "#,
        )
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
