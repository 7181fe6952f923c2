use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::category::{
        BulkCreateCategoriesRequest, BulkCreateCategoriesResponse, CreateCategoryRequest,
        UpdateCategoryRequest,
    },
    models::Category,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/races/{race_id}/categories",
    params(
        ("race_id" = Uuid, Path, description = "Race id")
    ),
    responses(
        (status = 200, description = "Categories of the race, in matching order", body = Vec<Category>),
        (status = 404, description = "Race not found")
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
) -> Result<Json<Vec<Category>>, WebError> {
    let categories = services::list_categories(db.pool(), race_id).await?;

    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/races/{race_id}/categories",
    params(
        ("race_id" = Uuid, Path, description = "Race id")
    ),
    request_body = CreateCategoryRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Category created successfully", body = Category),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Race not found")
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<Response, WebError> {
    req.validate()?;
    let new_category = req.into_new_category().map_err(WebError::BadRequest)?;

    let category = services::create_category(db.pool(), race_id, &new_category).await?;

    Ok((StatusCode::CREATED, Json(category)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/races/{race_id}/categories/bulk",
    params(
        ("race_id" = Uuid, Path, description = "Race id")
    ),
    request_body = BulkCreateCategoriesRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Missing combinations created", body = BulkCreateCategoriesResponse),
        (status = 400, description = "Invalid distances, age ranges or name template"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Race not found")
    ),
    tag = "categories"
)]
pub async fn bulk_create_categories(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
    Json(req): Json<BulkCreateCategoriesRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let response = services::bulk_create_categories(db.pool(), race_id, &req).await?;
    tracing::info!(
        %race_id,
        created = response.created.len(),
        skipped = response.skipped,
        "Bulk category creation"
    );

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/races/{race_id}/categories/{category_id}",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        ("category_id" = Uuid, Path, description = "Category id")
    ),
    request_body = UpdateCategoryRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Category updated successfully", body = Category),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(db): State<Database>,
    Path((race_id, category_id)): Path<(Uuid, Uuid)>,
    Json(update_req): Json<UpdateCategoryRequest>,
) -> Result<Response, WebError> {
    update_req.validate()?;

    let updated = services::update_category(db.pool(), race_id, category_id, &update_req).await?;

    Ok(Json(updated).into_response())
}

#[utoipa::path(
    post,
    path = "/api/races/{race_id}/categories/{category_id}/toggle",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        ("category_id" = Uuid, Path, description = "Category id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Category activation flipped", body = Category),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn toggle_category(
    State(db): State<Database>,
    Path((race_id, category_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    let category = services::toggle_category(db.pool(), race_id, category_id).await?;

    Ok(Json(category).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/races/{race_id}/categories/{category_id}",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        ("category_id" = Uuid, Path, description = "Category id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Category deleted; its participants become uncategorized"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(db): State<Database>,
    Path((race_id, category_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    services::delete_category(db.pool(), race_id, category_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    delete,
    path = "/api/races/{race_id}/categories",
    params(
        ("race_id" = Uuid, Path, description = "Race id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "All categories of the race deleted"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "categories"
)]
pub async fn delete_all_categories(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let deleted = services::delete_all_categories(db.pool(), race_id).await?;
    tracing::info!(%race_id, deleted, "Deleted all categories");

    Ok(StatusCode::NO_CONTENT.into_response())
}
