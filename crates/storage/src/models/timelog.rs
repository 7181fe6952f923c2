use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// What a timing punch records. Only `Finish` takes part in results.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum PunchKind {
    Start,
    Split,
    #[default]
    Finish,
}

impl PunchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Split => "split",
            Self::Finish => "finish",
        }
    }
}

impl fmt::Display for PunchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum PunchSource {
    #[default]
    Manual,
    Import,
    Device,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Timelog {
    pub timelog_id: Uuid,
    pub race_id: Uuid,
    /// `None` once the participant has been deleted.
    pub participant_id: Option<Uuid>,
    pub kind: PunchKind,
    pub elapsed_ms: i64,
    pub source: PunchSource,
    pub notes: Option<String>,
    pub recorded_at: chrono::NaiveDateTime,
}
