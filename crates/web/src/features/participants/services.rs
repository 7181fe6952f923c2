use sqlx::PgPool;
use storage::{
    dto::{
        assignment::RecalculationReport,
        common::{PaginatedResponse, PaginationParams},
        participant::{
            CreateParticipantRequest, NewParticipant, ParticipantDetail, UpdateParticipantRequest,
        },
    },
    error::{Result, StorageError},
    models::{Participant, PickupItem},
    repository::{
        category::CategoryRepository, participant::ParticipantRepository, race::RaceRepository,
    },
    services::category_assignment::{
        PgAssignmentStore, Runner, assign_category, recalculate_categories,
    },
};
use uuid::Uuid;

use crate::error::WebError;

/// List participants of a race, paginated
pub async fn list_participants(
    pool: &PgPool,
    race_id: Uuid,
    pagination: PaginationParams,
    uncategorized_only: bool,
) -> Result<PaginatedResponse<ParticipantDetail>> {
    RaceRepository::new(pool).find_by_id(race_id).await?;

    let repo = ParticipantRepository::new(pool);
    let (rows, total) = repo
        .list_detailed(race_id, &pagination, uncategorized_only)
        .await?;

    Ok(PaginatedResponse::new(rows, pagination, total))
}

pub async fn search_participants(
    pool: &PgPool,
    race_id: Uuid,
    term: &str,
) -> Result<Vec<ParticipantDetail>> {
    RaceRepository::new(pool).find_by_id(race_id).await?;

    let repo = ParticipantRepository::new(pool);
    repo.search(race_id, term).await
}

pub async fn get_participant(
    pool: &PgPool,
    race_id: Uuid,
    participant_id: Uuid,
) -> Result<ParticipantDetail> {
    let repo = ParticipantRepository::new(pool);
    repo.find_detailed(race_id, participant_id).await
}

/// Flip the chip or kit delivery flag of a participant
pub async fn toggle_pickup(
    pool: &PgPool,
    race_id: Uuid,
    participant_id: Uuid,
    item: PickupItem,
) -> Result<Participant> {
    let repo = ParticipantRepository::new(pool);
    let participant = repo.toggle_pickup(race_id, participant_id, item).await?;

    tracing::info!(
        %participant_id,
        item = item.column(),
        chip_delivered = participant.chip_delivered,
        kit_delivered = participant.kit_delivered,
        "Pickup status changed"
    );

    Ok(participant)
}

/// Register a participant and assign the category that fits them
pub async fn create_participant(
    pool: &PgPool,
    race_id: Uuid,
    request: CreateParticipantRequest,
) -> std::result::Result<Participant, WebError> {
    let race = RaceRepository::new(pool).find_by_id(race_id).await?;

    let mut participant = request
        .into_new_participant(race.race_date)
        .map_err(WebError::BadRequest)?;

    if let Some(runner) = runner_of(&participant) {
        let categories = CategoryRepository::new(pool)
            .list_active_by_race(race_id)
            .await?;
        participant.category_id = assign_category(&runner, &categories).map(|c| c.category_id);
    }

    let repo = ParticipantRepository::new(pool);
    Ok(repo.create(race_id, &participant).await?)
}

/// Update a participant.
///
/// The stored category is kept unless `category_id` is sent explicitly; a
/// sent id must belong to the same race.
pub async fn update_participant(
    pool: &PgPool,
    race_id: Uuid,
    participant_id: Uuid,
    request: &UpdateParticipantRequest,
) -> std::result::Result<Participant, WebError> {
    let race = RaceRepository::new(pool).find_by_id(race_id).await?;
    let repo = ParticipantRepository::new(pool);

    let existing = repo.find(race_id, participant_id).await?;
    let changes = request
        .merge(&existing, race.race_date)
        .map_err(WebError::BadRequest)?;

    if let Some(Some(category_id)) = request.category_id {
        match CategoryRepository::new(pool).find(race_id, category_id).await {
            Ok(_) => {}
            Err(StorageError::NotFound) => {
                return Err(WebError::BadRequest(format!(
                    "Category {category_id} does not belong to this race"
                )));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(%participant_id, %category_id, "Manual category override");
    }

    Ok(repo.update(participant_id, &changes).await?)
}

pub async fn delete_participant(pool: &PgPool, race_id: Uuid, participant_id: Uuid) -> Result<()> {
    let repo = ParticipantRepository::new(pool);
    repo.delete(race_id, participant_id).await
}

/// Recompute the category of every participant of a race
pub async fn recalculate(pool: &PgPool, race_id: Uuid, dry_run: bool) -> Result<RecalculationReport> {
    RaceRepository::new(pool).find_by_id(race_id).await?;

    let store = PgAssignmentStore::new(pool);
    recalculate_categories(&store, race_id, dry_run).await
}

fn runner_of(participant: &NewParticipant) -> Option<Runner> {
    Some(Runner {
        sex: participant.sex?,
        age: participant.age?,
        distance_km: participant.distance_km?,
    })
}
