use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::Sex;

/// Oldest age accepted as a plausible runner.
pub const MAX_PLAUSIBLE_AGE: i32 = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Participant {
    pub participant_id: Uuid,
    pub race_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub dni: Option<String>,
    pub sex: Option<Sex>,
    pub birth_date: Option<NaiveDate>,
    /// Age on race day, captured when the participant was registered.
    pub age: Option<i32>,
    pub distance_km: Option<Decimal>,
    pub bib_number: Option<String>,
    pub chip: Option<String>,
    pub chip_delivered: bool,
    pub kit_delivered: bool,
    /// Cached result of category assignment; only the matcher or an
    /// operator override writes it.
    pub category_id: Option<Uuid>,
    pub created_at: chrono::NaiveDateTime,
}

/// Items handed to a runner at kit pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupItem {
    Chip,
    Kit,
}

impl PickupItem {
    /// Flag column tracking delivery of the item.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Chip => "chip_delivered",
            Self::Kit => "kit_delivered",
        }
    }
}

/// Completed years between `birth_date` and `race_date`.
///
/// Returns `None` when the result falls outside `0..=120`, which in practice
/// means a mistyped birth date.
pub fn age_on(birth_date: NaiveDate, race_date: NaiveDate) -> Option<i32> {
    let mut age = race_date.year() - birth_date.year();
    if (race_date.month(), race_date.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }

    (0..=MAX_PLAUSIBLE_AGE).contains(&age).then_some(age)
}
