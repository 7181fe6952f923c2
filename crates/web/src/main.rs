use anyhow::Context;
use storage::Database;
use utoipa::OpenApi;

mod config;
mod error;
mod features;
mod middleware;
mod routes;

use config::Config;
use features::{categories, participants, races, results, timing};
use middleware::auth::ApiKeys;

#[derive(OpenApi)]
#[openapi(
    paths(
        races::handlers::list_races,
        races::handlers::get_race,
        races::handlers::create_race,
        races::handlers::update_race,
        races::handlers::delete_race,
        categories::handlers::list_categories,
        categories::handlers::create_category,
        categories::handlers::bulk_create_categories,
        categories::handlers::update_category,
        categories::handlers::toggle_category,
        categories::handlers::delete_category,
        categories::handlers::delete_all_categories,
        participants::handlers::list_participants,
        participants::handlers::search_participants,
        participants::handlers::get_participant,
        participants::handlers::create_participant,
        participants::handlers::update_participant,
        participants::handlers::delete_participant,
        participants::handlers::toggle_chip_delivered,
        participants::handlers::toggle_kit_delivered,
        participants::handlers::recalculate_categories,
        timing::handlers::record_punch,
        timing::handlers::recent_punches,
        results::handlers::get_results,
    ),
    components(
        schemas(
            storage::dto::race::CreateRaceRequest,
            storage::dto::race::UpdateRaceRequest,
            storage::dto::category::CreateCategoryRequest,
            storage::dto::category::UpdateCategoryRequest,
            storage::dto::category::BulkCreateCategoriesRequest,
            storage::dto::category::BulkCreateCategoriesResponse,
            storage::dto::category::SexLabel,
            storage::dto::participant::CreateParticipantRequest,
            storage::dto::participant::UpdateParticipantRequest,
            storage::dto::participant::ParticipantDetail,
            storage::dto::assignment::RecalculationReport,
            storage::dto::assignment::CategoryChange,
            storage::dto::assignment::AmbiguousAssignment,
            storage::dto::assignment::AssignmentFailure,
            storage::dto::timelog::RecordPunchRequest,
            storage::dto::timelog::RecentPunch,
            storage::dto::results::ResultsBoard,
            storage::dto::results::ResultEntry,
            storage::dto::common::PaginationMeta,
            storage::models::Race,
            storage::models::RaceStatus,
            storage::models::Category,
            storage::models::Sex,
            storage::models::Participant,
            storage::models::Timelog,
            storage::models::PunchKind,
            storage::models::PunchSource,
        )
    ),
    tags(
        (name = "races", description = "Race endpoints"),
        (name = "categories", description = "Category endpoints, including bulk generation"),
        (name = "participants", description = "Participant endpoints and category recalculation"),
        (name = "timing", description = "Timing punch endpoints"),
        (name = "results", description = "Ranked results"),
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting race timing API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config.redacted_database_url()
    );
    let db = Database::with_max_connections(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, every write endpoint will answer 401");
    }

    let app = routes::app(db, api_keys);

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    axum::serve(listener, app).await?;

    Ok(())
}
