use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::common::present;
use crate::models::RaceStatus;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRaceRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    pub race_date: NaiveDate,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[serde(default)]
    pub status: RaceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateRaceRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub race_date: Option<NaiveDate>,

    /// Absent keeps the location, `null` removes it.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 255))]
    pub location: Option<Option<String>>,

    pub status: Option<RaceStatus>,
}

impl UpdateRaceRequest {
    /// Location after applying the update on top of `current`.
    pub fn location_over(&self, current: Option<&str>) -> Option<String> {
        match &self.location {
            Some(location) => location.clone(),
            None => current.map(str::to_string),
        }
    }
}
