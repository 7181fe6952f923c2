use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::{
        assignment::{RecalculateQuery, RecalculationReport},
        common::PaginatedResponse,
        participant::{
            CreateParticipantRequest, ParticipantDetail, ParticipantListQuery,
            ParticipantSearchQuery, UpdateParticipantRequest,
        },
    },
    models::{Participant, PickupItem},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/races/{race_id}/participants",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        ParticipantListQuery
    ),
    responses(
        (status = 200, description = "Paginated participants with category names", body = PaginatedResponse<ParticipantDetail>),
        (status = 400, description = "Invalid pagination parameters"),
        (status = 404, description = "Race not found")
    ),
    tag = "participants"
)]
pub async fn list_participants(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
    Query(query): Query<ParticipantListQuery>,
) -> Result<Response, WebError> {
    let pagination = query.pagination();
    pagination.validate().map_err(WebError::BadRequest)?;

    let page =
        services::list_participants(db.pool(), race_id, pagination, query.uncategorized).await?;

    Ok(Json(page).into_response())
}

#[utoipa::path(
    get,
    path = "/api/races/{race_id}/participants/search",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        ParticipantSearchQuery
    ),
    responses(
        (status = 200, description = "Up to 100 matching participants", body = Vec<ParticipantDetail>),
        (status = 400, description = "Empty search term"),
        (status = 404, description = "Race not found")
    ),
    tag = "participants"
)]
pub async fn search_participants(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
    Query(query): Query<ParticipantSearchQuery>,
) -> Result<Json<Vec<ParticipantDetail>>, WebError> {
    let term = query.q.trim();
    if term.is_empty() {
        return Err(WebError::BadRequest("Search term must not be empty".to_string()));
    }

    let participants = services::search_participants(db.pool(), race_id, term).await?;

    Ok(Json(participants))
}

#[utoipa::path(
    get,
    path = "/api/races/{race_id}/participants/{participant_id}",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        ("participant_id" = Uuid, Path, description = "Participant id")
    ),
    responses(
        (status = 200, description = "Participant found", body = ParticipantDetail),
        (status = 404, description = "Participant not found")
    ),
    tag = "participants"
)]
pub async fn get_participant(
    State(db): State<Database>,
    Path((race_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    let participant = services::get_participant(db.pool(), race_id, participant_id).await?;

    Ok(Json(participant).into_response())
}

#[utoipa::path(
    post,
    path = "/api/races/{race_id}/participants",
    params(
        ("race_id" = Uuid, Path, description = "Race id")
    ),
    request_body = CreateParticipantRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Participant registered and categorized", body = Participant),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Race not found"),
        (status = 409, description = "Dni or bib number already used in this race")
    ),
    tag = "participants"
)]
pub async fn create_participant(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
    Json(req): Json<CreateParticipantRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let participant = services::create_participant(db.pool(), race_id, req).await?;
    tracing::info!(
        participant_id = %participant.participant_id,
        category_id = ?participant.category_id,
        "Participant registered"
    );

    Ok((StatusCode::CREATED, Json(participant)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/races/{race_id}/participants/{participant_id}",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        ("participant_id" = Uuid, Path, description = "Participant id")
    ),
    request_body = UpdateParticipantRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Participant updated successfully", body = Participant),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Participant not found"),
        (status = 409, description = "Dni or bib number already used in this race")
    ),
    tag = "participants"
)]
pub async fn update_participant(
    State(db): State<Database>,
    Path((race_id, participant_id)): Path<(Uuid, Uuid)>,
    Json(update_req): Json<UpdateParticipantRequest>,
) -> Result<Response, WebError> {
    update_req.validate()?;

    let updated =
        services::update_participant(db.pool(), race_id, participant_id, &update_req).await?;

    Ok(Json(updated).into_response())
}

#[utoipa::path(
    post,
    path = "/api/races/{race_id}/participants/{participant_id}/chip-delivered",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        ("participant_id" = Uuid, Path, description = "Participant id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Chip delivery flag flipped", body = Participant),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Participant not found")
    ),
    tag = "participants"
)]
pub async fn toggle_chip_delivered(
    State(db): State<Database>,
    Path((race_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    let participant =
        services::toggle_pickup(db.pool(), race_id, participant_id, PickupItem::Chip).await?;

    Ok(Json(participant).into_response())
}

#[utoipa::path(
    post,
    path = "/api/races/{race_id}/participants/{participant_id}/kit-delivered",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        ("participant_id" = Uuid, Path, description = "Participant id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Kit delivery flag flipped", body = Participant),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Participant not found")
    ),
    tag = "participants"
)]
pub async fn toggle_kit_delivered(
    State(db): State<Database>,
    Path((race_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    let participant =
        services::toggle_pickup(db.pool(), race_id, participant_id, PickupItem::Kit).await?;

    Ok(Json(participant).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/races/{race_id}/participants/{participant_id}",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        ("participant_id" = Uuid, Path, description = "Participant id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Participant deleted; their punches are kept"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Participant not found")
    ),
    tag = "participants"
)]
pub async fn delete_participant(
    State(db): State<Database>,
    Path((race_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    services::delete_participant(db.pool(), race_id, participant_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    post,
    path = "/api/races/{race_id}/participants/recalculate-categories",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        RecalculateQuery
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Recalculation report", body = RecalculationReport),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Race not found")
    ),
    tag = "participants"
)]
pub async fn recalculate_categories(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
    Query(query): Query<RecalculateQuery>,
) -> Result<Json<RecalculationReport>, WebError> {
    let report = services::recalculate(db.pool(), race_id, query.dry_run).await?;

    Ok(Json(report))
}
