use sqlx::PgPool;
use storage::{
    dto::category::{
        BulkCreateCategoriesRequest, BulkCreateCategoriesResponse, NewCategory,
        UpdateCategoryRequest,
    },
    error::Result,
    models::Category,
    repository::{category::CategoryRepository, race::RaceRepository},
};
use uuid::Uuid;

use crate::error::WebError;

/// List every category of a race, active or not
pub async fn list_categories(pool: &PgPool, race_id: Uuid) -> Result<Vec<Category>> {
    RaceRepository::new(pool).find_by_id(race_id).await?;
    CategoryRepository::new(pool).list_by_race(race_id).await
}

/// Create a single category
pub async fn create_category(
    pool: &PgPool,
    race_id: Uuid,
    category: &NewCategory,
) -> Result<Category> {
    RaceRepository::new(pool).find_by_id(race_id).await?;
    CategoryRepository::new(pool).create(race_id, category).await
}

/// Create every distance × age range × sex combination not yet present
pub async fn bulk_create_categories(
    pool: &PgPool,
    race_id: Uuid,
    request: &BulkCreateCategoriesRequest,
) -> std::result::Result<BulkCreateCategoriesResponse, WebError> {
    RaceRepository::new(pool).find_by_id(race_id).await?;

    let repo = CategoryRepository::new(pool);
    let existing = repo.list_by_race(race_id).await?;

    let (rows, skipped) = request.expand(&existing).map_err(WebError::BadRequest)?;
    let created = repo.create_many(race_id, &rows).await?;

    Ok(BulkCreateCategoriesResponse { created, skipped })
}

/// Update a category
pub async fn update_category(
    pool: &PgPool,
    race_id: Uuid,
    category_id: Uuid,
    request: &UpdateCategoryRequest,
) -> std::result::Result<Category, WebError> {
    let repo = CategoryRepository::new(pool);

    let existing = repo.find(race_id, category_id).await?;
    let merged = request.merge(&existing).map_err(WebError::BadRequest)?;

    Ok(repo.update(&existing, &merged).await?)
}

/// Activate an inactive category or deactivate an active one
pub async fn toggle_category(pool: &PgPool, race_id: Uuid, category_id: Uuid) -> Result<Category> {
    let repo = CategoryRepository::new(pool);
    repo.toggle_active(race_id, category_id).await
}

/// Delete a category
pub async fn delete_category(pool: &PgPool, race_id: Uuid, category_id: Uuid) -> Result<()> {
    let repo = CategoryRepository::new(pool);
    repo.delete(race_id, category_id).await
}

/// Delete all categories of a race
pub async fn delete_all_categories(pool: &PgPool, race_id: Uuid) -> Result<u64> {
    let repo = CategoryRepository::new(pool);
    repo.delete_all(race_id).await
}
