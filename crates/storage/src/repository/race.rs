use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::race::{CreateRaceRequest, UpdateRaceRequest};
use crate::error::{Result, StorageError};
use crate::models::Race;

const RACE_COLUMNS: &str = "race_id, name, race_date, location, status, created_at";

pub struct RaceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RaceRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all races, most recent first
    pub async fn list(&self) -> Result<Vec<Race>> {
        let races = sqlx::query_as::<_, Race>(&format!(
            "SELECT {RACE_COLUMNS} FROM races ORDER BY race_date DESC, name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(races)
    }

    pub async fn find_by_id(&self, race_id: Uuid) -> Result<Race> {
        sqlx::query_as::<_, Race>(&format!(
            "SELECT {RACE_COLUMNS} FROM races WHERE race_id = $1"
        ))
        .bind(race_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn create(&self, req: &CreateRaceRequest) -> Result<Race> {
        let race = sqlx::query_as::<_, Race>(&format!(
            r#"
            INSERT INTO races (name, race_date, location, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {RACE_COLUMNS}
            "#
        ))
        .bind(req.name.trim())
        .bind(req.race_date)
        .bind(&req.location)
        .bind(req.status)
        .fetch_one(self.pool)
        .await?;

        Ok(race)
    }

    pub async fn update(&self, existing: &Race, req: &UpdateRaceRequest) -> Result<Race> {
        let name = req.name.as_deref().map(str::trim).unwrap_or(&existing.name);
        let race_date = req.race_date.unwrap_or(existing.race_date);
        let location = req.location_over(existing.location.as_deref());
        let status = req.status.unwrap_or(existing.status);

        sqlx::query_as::<_, Race>(&format!(
            r#"
            UPDATE races
            SET name = $2, race_date = $3, location = $4, status = $5
            WHERE race_id = $1
            RETURNING {RACE_COLUMNS}
            "#
        ))
        .bind(existing.race_id)
        .bind(name)
        .bind(race_date)
        .bind(location)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    /// Delete a race along with its categories, participants and timelogs
    pub async fn delete(&self, race_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM races WHERE race_id = $1")
            .bind(race_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
