use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::timelog::{RecentPunch, RecentPunchesQuery, RecordPunchRequest},
    models::Timelog,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    post,
    path = "/api/races/{race_id}/timelogs",
    params(
        ("race_id" = Uuid, Path, description = "Race id")
    ),
    request_body = RecordPunchRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Punch recorded", body = Timelog),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Race or bib not found")
    ),
    tag = "timing"
)]
pub async fn record_punch(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
    Json(req): Json<RecordPunchRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let timelog = services::record_punch(db.pool(), race_id, req).await?;
    tracing::debug!(
        timelog_id = %timelog.timelog_id,
        kind = %timelog.kind,
        elapsed_ms = timelog.elapsed_ms,
        "Punch recorded"
    );

    Ok((StatusCode::CREATED, Json(timelog)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/races/{race_id}/timelogs/recent",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        RecentPunchesQuery
    ),
    responses(
        (status = 200, description = "Latest punches, newest first", body = Vec<RecentPunch>),
        (status = 400, description = "Limit out of range")
    ),
    tag = "timing"
)]
pub async fn recent_punches(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
    Query(query): Query<RecentPunchesQuery>,
) -> Result<Json<Vec<RecentPunch>>, WebError> {
    query.validate().map_err(WebError::BadRequest)?;

    let punches = services::recent_punches(db.pool(), race_id, query.limit).await?;

    Ok(Json(punches))
}
