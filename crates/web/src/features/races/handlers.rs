use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::race::{CreateRaceRequest, UpdateRaceRequest},
    models::Race,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/races",
    responses(
        (status = 200, description = "List all races", body = Vec<Race>)
    ),
    tag = "races"
)]
pub async fn list_races(State(db): State<Database>) -> Result<Json<Vec<Race>>, WebError> {
    let races = services::list_races(db.pool()).await?;

    Ok(Json(races))
}

#[utoipa::path(
    get,
    path = "/api/races/{race_id}",
    params(
        ("race_id" = Uuid, Path, description = "Race id")
    ),
    responses(
        (status = 200, description = "Race found", body = Race),
        (status = 404, description = "Race not found")
    ),
    tag = "races"
)]
pub async fn get_race(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let race = services::get_race(db.pool(), race_id).await?;

    Ok(Json(race).into_response())
}

#[utoipa::path(
    post,
    path = "/api/races",
    request_body = CreateRaceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Race created successfully", body = Race),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "races"
)]
pub async fn create_race(
    State(db): State<Database>,
    Json(req): Json<CreateRaceRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let race = services::create_race(db.pool(), &req).await?;
    tracing::info!(race_id = %race.race_id, "Race created");

    Ok((StatusCode::CREATED, Json(race)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/races/{race_id}",
    params(
        ("race_id" = Uuid, Path, description = "Race id")
    ),
    request_body = UpdateRaceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Race updated successfully", body = Race),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Race not found")
    ),
    tag = "races"
)]
pub async fn update_race(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
    Json(update_req): Json<UpdateRaceRequest>,
) -> Result<Response, WebError> {
    update_req.validate()?;

    let updated = services::update_race(db.pool(), race_id, &update_req).await?;

    Ok(Json(updated).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/races/{race_id}",
    params(
        ("race_id" = Uuid, Path, description = "Race id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Race deleted with its categories, participants and timelogs"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Race not found")
    ),
    tag = "races"
)]
pub async fn delete_race(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
) -> Result<Response, WebError> {
    services::delete_race(db.pool(), race_id).await?;
    tracing::info!(%race_id, "Race deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}
