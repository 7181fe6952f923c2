use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::Sex;
use crate::services::results_ranking::{CategoryFilter, RankedResult};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ResultsQuery {
    /// `ALL` or a category id.
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub category: CategoryFilter,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResultEntry {
    /// 1-based place within the listed results.
    pub position: u32,
    pub participant_id: Uuid,
    pub bib_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub sex: Option<Sex>,
    pub distance_km: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    /// Best finish exactly as punched.
    pub elapsed_ms: i64,
    /// Behind the first listed finisher, in milliseconds.
    pub gap_ms: i64,
    /// `gap_ms` as `hh:mm:ss.mmm`.
    pub gap: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResultsBoard {
    pub race_id: Uuid,
    pub category: String,
    pub entries: Vec<ResultEntry>,
}

impl ResultsBoard {
    /// Numbers `results` in order and measures gaps from the first entry.
    pub fn new(race_id: Uuid, filter: CategoryFilter, results: Vec<RankedResult>) -> Self {
        let leader = results.first().map(|r| r.best_elapsed_ms).unwrap_or_default();

        let entries = results
            .into_iter()
            .zip(1u32..)
            .map(|(result, position)| {
                let gap_ms = result.best_elapsed_ms - leader;
                let p = result.participant;
                ResultEntry {
                    position,
                    participant_id: p.participant_id,
                    bib_number: p.bib_number,
                    first_name: p.first_name,
                    last_name: p.last_name,
                    sex: p.sex,
                    distance_km: p.distance_km,
                    category_id: p.category_id,
                    category_name: p.category_name,
                    elapsed_ms: result.best_elapsed_ms,
                    gap_ms,
                    gap: format_clock(gap_ms),
                }
            })
            .collect();

        Self {
            race_id,
            category: filter.to_string(),
            entries,
        }
    }
}

/// Formats milliseconds as `hh:mm:ss.mmm`; hours grow past two digits.
pub fn format_clock(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let ms = ms.unsigned_abs();

    let hours = ms / 3_600_000;
    let minutes = ms / 60_000 % 60;
    let seconds = ms / 1_000 % 60;
    let millis = ms % 1_000;

    format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}
