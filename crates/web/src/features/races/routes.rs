use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use storage::Database;

use super::handlers::{create_race, delete_race, get_race, list_races, update_race};
use crate::middleware::auth::{ApiKeys, require_auth};

pub fn routes(api_keys: ApiKeys) -> Router<Database> {
    let protected = Router::new()
        .route("/", post(create_race))
        .route("/:race_id", put(update_race).delete(delete_race))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/", get(list_races))
        .route("/:race_id", get(get_race))
        .merge(protected)
}
