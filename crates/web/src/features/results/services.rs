use sqlx::PgPool;
use storage::{
    dto::results::ResultsBoard,
    error::Result,
    services::results_ranking::{self, CategoryFilter},
};
use uuid::Uuid;

/// Ranked finishers of a race, optionally narrowed to one category
pub async fn results_board(
    pool: &PgPool,
    race_id: Uuid,
    filter: CategoryFilter,
) -> Result<ResultsBoard> {
    results_ranking::results_board(pool, race_id, filter).await
}
