use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use storage::Database;

use super::handlers::{
    create_participant, delete_participant, get_participant, list_participants,
    recalculate_categories, search_participants, toggle_chip_delivered, toggle_kit_delivered,
    update_participant,
};
use crate::middleware::auth::{ApiKeys, require_auth};

pub fn routes(api_keys: ApiKeys) -> Router<Database> {
    let protected = Router::new()
        .route("/:race_id/participants", post(create_participant))
        .route(
            "/:race_id/participants/recalculate-categories",
            post(recalculate_categories),
        )
        .route(
            "/:race_id/participants/:participant_id",
            put(update_participant).delete(delete_participant),
        )
        .route(
            "/:race_id/participants/:participant_id/chip-delivered",
            post(toggle_chip_delivered),
        )
        .route(
            "/:race_id/participants/:participant_id/kit-delivered",
            post(toggle_kit_delivered),
        )
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:race_id/participants", get(list_participants))
        .route("/:race_id/participants/search", get(search_participants))
        .route("/:race_id/participants/:participant_id", get(get_participant))
        .merge(protected)
}
