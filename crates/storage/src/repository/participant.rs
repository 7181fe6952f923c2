use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::common::PaginationParams;
use crate::dto::participant::{NewParticipant, ParticipantDetail};
use crate::error::{Result, StorageError};
use crate::models::{Participant, PickupItem};

const PARTICIPANT_COLUMNS: &str = "participant_id, race_id, first_name, last_name, dni, sex, \
     birth_date, age, distance_km, bib_number, chip, chip_delivered, kit_delivered, category_id, \
     created_at";

const DETAIL_SELECT: &str = r#"
    SELECT p.participant_id, p.race_id, p.first_name, p.last_name, p.dni, p.sex,
           p.birth_date, p.age, p.distance_km, p.bib_number, p.chip, p.chip_delivered,
           p.kit_delivered, p.category_id, p.created_at,
           c.name AS category_name
    FROM participants p
    LEFT JOIN categories c ON c.category_id = p.category_id
"#;

const SEARCH_LIMIT: i64 = 100;

pub struct ParticipantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ParticipantRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every participant of a race, as stored
    pub async fn list_by_race(&self, race_id: Uuid) -> Result<Vec<Participant>> {
        let participants = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants
             WHERE race_id = $1
             ORDER BY last_name, first_name, participant_id"
        ))
        .bind(race_id)
        .fetch_all(self.pool)
        .await?;

        Ok(participants)
    }

    /// One page of participants with their category names
    pub async fn list_detailed(
        &self,
        race_id: Uuid,
        pagination: &PaginationParams,
        uncategorized_only: bool,
    ) -> Result<(Vec<ParticipantDetail>, i64)> {
        let total_items = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM participants
             WHERE race_id = $1 AND (NOT $2 OR category_id IS NULL)",
        )
        .bind(race_id)
        .bind(uncategorized_only)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ParticipantDetail>(&format!(
            "{DETAIL_SELECT}
             WHERE p.race_id = $1 AND (NOT $2 OR p.category_id IS NULL)
             ORDER BY p.last_name, p.first_name, p.participant_id
             LIMIT $3 OFFSET $4"
        ))
        .bind(race_id)
        .bind(uncategorized_only)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((rows, total_items))
    }

    pub async fn find_detailed(&self, race_id: Uuid, participant_id: Uuid) -> Result<ParticipantDetail> {
        sqlx::query_as::<_, ParticipantDetail>(&format!(
            "{DETAIL_SELECT} WHERE p.race_id = $1 AND p.participant_id = $2"
        ))
        .bind(race_id)
        .bind(participant_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn find(&self, race_id: Uuid, participant_id: Uuid) -> Result<Participant> {
        sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants
             WHERE race_id = $1 AND participant_id = $2"
        ))
        .bind(race_id)
        .bind(participant_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn find_by_bib(&self, race_id: Uuid, bib_number: &str) -> Result<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants
             WHERE race_id = $1 AND bib_number = $2
             LIMIT 1"
        ))
        .bind(race_id)
        .bind(bib_number)
        .fetch_optional(self.pool)
        .await?;

        Ok(participant)
    }

    /// Case-insensitive substring search on names and dni
    pub async fn search(&self, race_id: Uuid, term: &str) -> Result<Vec<ParticipantDetail>> {
        let pattern = format!("%{}%", escape_like(term));

        let rows = sqlx::query_as::<_, ParticipantDetail>(&format!(
            "{DETAIL_SELECT}
             WHERE p.race_id = $1
               AND (p.last_name ILIKE $2 OR p.first_name ILIKE $2 OR p.dni ILIKE $2)
             ORDER BY p.last_name, p.first_name
             LIMIT $3"
        ))
        .bind(race_id)
        .bind(pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn create(&self, race_id: Uuid, new: &NewParticipant) -> Result<Participant> {
        sqlx::query_as::<_, Participant>(&format!(
            r#"
            INSERT INTO participants (race_id, first_name, last_name, dni, sex, birth_date,
                                      age, distance_km, bib_number, chip, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(race_id)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.dni)
        .bind(new.sex)
        .bind(new.birth_date)
        .bind(new.age)
        .bind(new.distance_km)
        .bind(&new.bib_number)
        .bind(&new.chip)
        .bind(new.category_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            StorageError::from(e).constraint("A participant with this dni or bib number already exists")
        })
    }

    pub async fn update(&self, participant_id: Uuid, changes: &NewParticipant) -> Result<Participant> {
        sqlx::query_as::<_, Participant>(&format!(
            r#"
            UPDATE participants
            SET first_name = $2, last_name = $3, dni = $4, sex = $5, birth_date = $6,
                age = $7, distance_km = $8, bib_number = $9, chip = $10, category_id = $11
            WHERE participant_id = $1
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(participant_id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.dni)
        .bind(changes.sex)
        .bind(changes.birth_date)
        .bind(changes.age)
        .bind(changes.distance_km)
        .bind(&changes.bib_number)
        .bind(&changes.chip)
        .bind(changes.category_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            StorageError::from(e).constraint("Dni or bib number clash, or unknown category")
        })?
        .ok_or(StorageError::NotFound)
    }

    /// Single-row write of the derived category
    pub async fn set_category(&self, participant_id: Uuid, category_id: Option<Uuid>) -> Result<()> {
        let result = sqlx::query("UPDATE participants SET category_id = $2 WHERE participant_id = $1")
            .bind(participant_id)
            .bind(category_id)
            .execute(self.pool)
            .await
            .map_err(|e| StorageError::from(e).constraint("Category no longer exists"))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    /// Flip the delivery flag of a pickup item and return the updated row
    pub async fn toggle_pickup(
        &self,
        race_id: Uuid,
        participant_id: Uuid,
        item: PickupItem,
    ) -> Result<Participant> {
        sqlx::query_as::<_, Participant>(&pickup_toggle_sql(item))
            .bind(race_id)
            .bind(participant_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound)
    }

    pub async fn delete(&self, race_id: Uuid, participant_id: Uuid) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM participants WHERE race_id = $1 AND participant_id = $2")
                .bind(race_id)
                .bind(participant_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}

fn pickup_toggle_sql(item: PickupItem) -> String {
    let column = item.column();
    format!(
        r#"
        UPDATE participants
        SET {column} = NOT {column}
        WHERE race_id = $1 AND participant_id = $2
        RETURNING {PARTICIPANT_COLUMNS}
        "#
    )
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
