use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::dto::timelog::{NewTimelog, RecentPunch};
use crate::error::{Result, StorageError};
use crate::models::{PunchKind, Sex, Timelog};
use crate::services::results_ranking::{ParticipantSummary, TimingPunch};

const TIMELOG_COLUMNS: &str =
    "timelog_id, race_id, participant_id, kind, elapsed_ms, source, notes, recorded_at";

/// Flat shape of a timelog joined with its (possibly deleted) participant.
#[derive(FromRow)]
struct PunchRow {
    timelog_id: Uuid,
    kind: PunchKind,
    elapsed_ms: i64,
    participant_id: Option<Uuid>,
    bib_number: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    sex: Option<Sex>,
    distance_km: Option<Decimal>,
    category_id: Option<Uuid>,
    category_name: Option<String>,
}

impl From<PunchRow> for TimingPunch {
    fn from(row: PunchRow) -> Self {
        let participant = match (row.participant_id, row.first_name, row.last_name) {
            (Some(participant_id), Some(first_name), Some(last_name)) => Some(ParticipantSummary {
                participant_id,
                bib_number: row.bib_number,
                first_name,
                last_name,
                sex: row.sex,
                distance_km: row.distance_km,
                category_id: row.category_id,
                category_name: row.category_name,
            }),
            _ => None,
        };

        Self {
            timelog_id: row.timelog_id,
            kind: row.kind,
            elapsed_ms: row.elapsed_ms,
            participant,
        }
    }
}

pub struct TimelogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TimelogRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, race_id: Uuid, new: &NewTimelog) -> Result<Timelog> {
        sqlx::query_as::<_, Timelog>(&format!(
            r#"
            INSERT INTO timelogs (race_id, participant_id, kind, elapsed_ms, source, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TIMELOG_COLUMNS}
            "#
        ))
        .bind(race_id)
        .bind(new.participant_id)
        .bind(new.kind)
        .bind(new.elapsed_ms)
        .bind(new.source)
        .bind(&new.notes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| StorageError::from(e).constraint("Participant does not belong to this race"))
    }

    /// Latest punches of a race, newest first
    pub async fn recent(&self, race_id: Uuid, limit: i64) -> Result<Vec<RecentPunch>> {
        let rows = sqlx::query_as::<_, RecentPunch>(
            r#"
            SELECT t.timelog_id, t.participant_id, p.bib_number, p.first_name, p.last_name,
                   t.kind, t.elapsed_ms, t.recorded_at
            FROM timelogs t
            LEFT JOIN participants p ON p.participant_id = t.participant_id
            WHERE t.race_id = $1
            ORDER BY t.recorded_at DESC, t.timelog_id
            LIMIT $2
            "#,
        )
        .bind(race_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Finish punches of a race with participant and category data, in
    /// recording order
    pub async fn finish_punches(&self, race_id: Uuid) -> Result<Vec<TimingPunch>> {
        let rows = sqlx::query_as::<_, PunchRow>(
            r#"
            SELECT t.timelog_id, t.kind, t.elapsed_ms,
                   p.participant_id, p.bib_number, p.first_name, p.last_name,
                   p.sex, p.distance_km, p.category_id,
                   c.name AS category_name
            FROM timelogs t
            LEFT JOIN participants p
                   ON p.participant_id = t.participant_id AND p.race_id = t.race_id
            LEFT JOIN categories c ON c.category_id = p.category_id
            WHERE t.race_id = $1 AND t.kind = $2
            ORDER BY t.recorded_at, t.timelog_id
            "#,
        )
        .bind(race_id)
        .bind(PunchKind::Finish)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(TimingPunch::from).collect())
    }
}
