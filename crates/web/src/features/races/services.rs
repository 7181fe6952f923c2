use sqlx::PgPool;
use storage::{
    dto::race::{CreateRaceRequest, UpdateRaceRequest},
    error::Result,
    models::Race,
    repository::race::RaceRepository,
};
use uuid::Uuid;

/// List all races
pub async fn list_races(pool: &PgPool) -> Result<Vec<Race>> {
    let repo = RaceRepository::new(pool);
    repo.list().await
}

/// Get race by id
pub async fn get_race(pool: &PgPool, race_id: Uuid) -> Result<Race> {
    let repo = RaceRepository::new(pool);
    repo.find_by_id(race_id).await
}

/// Create a new race
pub async fn create_race(pool: &PgPool, request: &CreateRaceRequest) -> Result<Race> {
    let repo = RaceRepository::new(pool);
    repo.create(request).await
}

/// Update a race
pub async fn update_race(pool: &PgPool, race_id: Uuid, request: &UpdateRaceRequest) -> Result<Race> {
    let repo = RaceRepository::new(pool);

    let existing = repo.find_by_id(race_id).await?;
    repo.update(&existing, request).await
}

/// Delete a race and everything recorded for it
pub async fn delete_race(pool: &PgPool, race_id: Uuid) -> Result<()> {
    let repo = RaceRepository::new(pool);
    repo.delete(race_id).await
}
