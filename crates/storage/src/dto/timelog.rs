use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{PunchKind, PunchSource};

pub const MAX_RECENT: u32 = 100;

/// Records a punch for the runner wearing `bib_number`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordPunchRequest {
    #[validate(length(min = 1, max = 32, message = "Bib number is required"))]
    pub bib_number: String,

    #[serde(default)]
    pub kind: PunchKind,

    /// Defaults to the current wall-clock time in milliseconds.
    #[validate(range(min = 0))]
    pub elapsed_ms: Option<i64>,

    #[serde(default)]
    pub source: PunchSource,

    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Timelog fields ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTimelog {
    pub participant_id: Uuid,
    pub kind: PunchKind,
    pub elapsed_ms: i64,
    pub source: PunchSource,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct RecentPunch {
    pub timelog_id: Uuid,
    pub participant_id: Option<Uuid>,
    pub bib_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub kind: PunchKind,
    pub elapsed_ms: i64,
    pub recorded_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct RecentPunchesQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    10
}

impl RecentPunchesQuery {
    pub fn validate(&self) -> Result<(), String> {
        if self.limit < 1 || self.limit > MAX_RECENT {
            return Err(format!("limit must be between 1 and {MAX_RECENT}"));
        }
        Ok(())
    }
}
