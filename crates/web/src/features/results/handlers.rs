use axum::{
    Json,
    extract::{Path, Query, State},
};
use storage::{
    Database,
    dto::results::{ResultsBoard, ResultsQuery},
};
use uuid::Uuid;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/races/{race_id}/results",
    params(
        ("race_id" = Uuid, Path, description = "Race id"),
        ResultsQuery
    ),
    responses(
        (status = 200, description = "Best finish per participant, fastest first", body = ResultsBoard),
        (status = 400, description = "Category is neither ALL nor a category id"),
        (status = 404, description = "Race not found")
    ),
    tag = "results"
)]
pub async fn get_results(
    State(db): State<Database>,
    Path(race_id): Path<Uuid>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<ResultsBoard>, WebError> {
    let board = services::results_board(db.pool(), race_id, query.category).await?;

    Ok(Json(board))
}
