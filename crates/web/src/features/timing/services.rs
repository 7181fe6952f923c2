use chrono::Utc;
use sqlx::PgPool;
use storage::{
    dto::timelog::{NewTimelog, RecentPunch, RecordPunchRequest},
    error::Result,
    models::Timelog,
    repository::{
        participant::ParticipantRepository, race::RaceRepository, timelog::TimelogRepository,
    },
};
use uuid::Uuid;

use crate::error::WebError;

/// Record a punch for the participant wearing the requested bib
pub async fn record_punch(
    pool: &PgPool,
    race_id: Uuid,
    request: RecordPunchRequest,
) -> std::result::Result<Timelog, WebError> {
    RaceRepository::new(pool).find_by_id(race_id).await?;

    let bib = request.bib_number.trim();
    let participant = ParticipantRepository::new(pool)
        .find_by_bib(race_id, bib)
        .await?
        .ok_or_else(|| WebError::not_found(format!("Bib {bib}")))?;

    let new = NewTimelog {
        participant_id: participant.participant_id,
        kind: request.kind,
        elapsed_ms: request
            .elapsed_ms
            .unwrap_or_else(|| Utc::now().timestamp_millis()),
        source: request.source,
        notes: request.notes,
    };

    let repo = TimelogRepository::new(pool);
    Ok(repo.create(race_id, &new).await?)
}

/// Latest punches of a race, newest first
pub async fn recent_punches(pool: &PgPool, race_id: Uuid, limit: u32) -> Result<Vec<RecentPunch>> {
    let repo = TimelogRepository::new(pool);
    repo.recent(race_id, i64::from(limit)).await
}
