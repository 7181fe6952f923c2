use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::Sex;

/// Lower bound assumed when a category leaves `age_min` open.
pub const OPEN_AGE_MIN: i32 = 0;
/// Upper bound assumed when a category leaves `age_max` open.
pub const OPEN_AGE_MAX: i32 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub category_id: Uuid,
    pub race_id: Uuid,
    pub name: String,
    pub distance_km: Decimal,
    pub sex: Sex,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub is_active: bool,
    pub created_at: chrono::NaiveDateTime,
}

impl Category {
    /// Inclusive age check; a missing bound leaves that side open.
    pub fn admits_age(&self, age: i32) -> bool {
        self.age_min.is_none_or(|min| age >= min) && self.age_max.is_none_or(|max| age <= max)
    }

    /// Width of the age bracket, reading open bounds as 0 and 200.
    pub fn age_span(&self) -> i32 {
        self.age_max.unwrap_or(OPEN_AGE_MAX) - self.age_min.unwrap_or(OPEN_AGE_MIN)
    }

    /// Key under which two categories of a race count as duplicates.
    pub fn dedup_key(&self) -> (Decimal, Sex, Option<i32>, Option<i32>) {
        (self.distance_km.normalize(), self.sex, self.age_min, self.age_max)
    }
}
