use axum::{
    Router, middleware,
    routing::{get, post},
};
use storage::Database;

use super::handlers::{recent_punches, record_punch};
use crate::middleware::auth::{ApiKeys, require_auth};

pub fn routes(api_keys: ApiKeys) -> Router<Database> {
    let protected = Router::new()
        .route("/:race_id/timelogs", post(record_punch))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:race_id/timelogs/recent", get(recent_punches))
        .merge(protected)
}
