use axum::{Router, routing::get};
use storage::Database;

use super::handlers::get_results;

pub fn routes() -> Router<Database> {
    Router::new().route("/:race_id/results", get(get_results))
}
