use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use storage::Database;

use super::handlers::{
    bulk_create_categories, create_category, delete_all_categories, delete_category,
    list_categories, toggle_category, update_category,
};
use crate::middleware::auth::{ApiKeys, require_auth};

pub fn routes(api_keys: ApiKeys) -> Router<Database> {
    let protected = Router::new()
        .route(
            "/:race_id/categories",
            post(create_category).delete(delete_all_categories),
        )
        .route("/:race_id/categories/bulk", post(bulk_create_categories))
        .route(
            "/:race_id/categories/:category_id",
            put(update_category).delete(delete_category),
        )
        .route(
            "/:race_id/categories/:category_id/toggle",
            post(toggle_category),
        )
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:race_id/categories", get(list_categories))
        .merge(protected)
}
