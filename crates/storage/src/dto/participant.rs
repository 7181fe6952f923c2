use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{PaginationParams, normalize_distance, present};
use crate::models::{Participant, Sex, age_on};

/// Participant fields as they will be written, with age and dni resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewParticipant {
    pub first_name: String,
    pub last_name: String,
    pub dni: Option<String>,
    pub sex: Option<Sex>,
    pub birth_date: Option<NaiveDate>,
    pub age: Option<i32>,
    pub distance_km: Option<Decimal>,
    pub bib_number: Option<String>,
    pub chip: Option<String>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ParticipantDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub participant: Participant,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateParticipantRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "First name must be between 1 and 255 characters"
    ))]
    pub first_name: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Last name must be between 1 and 255 characters"
    ))]
    pub last_name: String,

    #[validate(custom(function = "validate_dni"))]
    pub dni: Option<String>,

    pub sex: Option<Sex>,

    /// Takes precedence over `age`; age is then computed for the race date.
    pub birth_date: Option<NaiveDate>,

    #[validate(range(min = 0, max = 120))]
    pub age: Option<i32>,

    pub distance_km: Option<Decimal>,

    #[validate(length(min = 1, max = 32))]
    pub bib_number: Option<String>,

    /// Timing chip code handed out with the race kit.
    #[validate(length(min = 1, max = 64))]
    pub chip: Option<String>,
}

impl CreateParticipantRequest {
    pub fn into_new_participant(self, race_date: NaiveDate) -> Result<NewParticipant, String> {
        let age = resolve_age(self.birth_date, self.age, race_date)?;
        let distance_km = self.distance_km.map(normalize_distance).transpose()?;

        Ok(NewParticipant {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            dni: self.dni.as_deref().map(normalize_dni),
            sex: self.sex,
            birth_date: self.birth_date,
            age,
            distance_km,
            bib_number: self.bib_number.map(|b| b.trim().to_string()),
            chip: self.chip.map(|c| c.trim().to_string()),
            category_id: None,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateParticipantRequest {
    #[validate(length(min = 1, max = 255))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub last_name: Option<String>,

    #[validate(custom(function = "validate_dni"))]
    pub dni: Option<String>,

    pub sex: Option<Sex>,

    pub birth_date: Option<NaiveDate>,

    #[validate(range(min = 0, max = 120))]
    pub age: Option<i32>,

    pub distance_km: Option<Decimal>,

    #[validate(length(min = 1, max = 32))]
    pub bib_number: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub chip: Option<String>,

    /// Manual override. Absent keeps the current category, `null` clears it.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,
}

impl UpdateParticipantRequest {
    pub fn merge(&self, existing: &Participant, race_date: NaiveDate) -> Result<NewParticipant, String> {
        let birth_date = self.birth_date.or(existing.birth_date);
        let age = match (self.birth_date, self.age) {
            (None, None) => existing.age,
            (birth, age) => resolve_age(birth, age, race_date)?,
        };
        let distance_km = match self.distance_km {
            Some(km) => Some(normalize_distance(km)?),
            None => existing.distance_km,
        };

        Ok(NewParticipant {
            first_name: self
                .first_name
                .as_ref()
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| existing.first_name.clone()),
            last_name: self
                .last_name
                .as_ref()
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| existing.last_name.clone()),
            dni: self
                .dni
                .as_deref()
                .map(normalize_dni)
                .or_else(|| existing.dni.clone()),
            sex: self.sex.or(existing.sex),
            birth_date,
            age,
            distance_km,
            bib_number: self
                .bib_number
                .as_ref()
                .map(|b| b.trim().to_string())
                .or_else(|| existing.bib_number.clone()),
            chip: self
                .chip
                .as_ref()
                .map(|c| c.trim().to_string())
                .or_else(|| existing.chip.clone()),
            category_id: self.category_id.unwrap_or(existing.category_id),
        })
    }
}

fn resolve_age(
    birth_date: Option<NaiveDate>,
    age: Option<i32>,
    race_date: NaiveDate,
) -> Result<Option<i32>, String> {
    match birth_date {
        Some(birth) => age_on(birth, race_date)
            .map(Some)
            .ok_or_else(|| format!("Birth date {birth} gives an implausible age on {race_date}")),
        None => Ok(age),
    }
}

/// Keeps only the digits of an identity number, so "12.345.678" and
/// "12345678" compare equal.
pub fn normalize_dni(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

// Validation helper
fn validate_dni(dni: &str) -> Result<(), validator::ValidationError> {
    let allowed = dni
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | ' '));
    let digits = normalize_dni(dni).len();

    if allowed && (6..=12).contains(&digits) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_dni"))
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ParticipantListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Only participants without a category.
    #[serde(default)]
    pub uncategorized: bool,
}

fn default_page() -> u32 {
    PaginationParams::default().page
}

fn default_page_size() -> u32 {
    PaginationParams::default().page_size
}

impl ParticipantListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ParticipantSearchQuery {
    /// Matched case-insensitively against first name, last name and dni.
    pub q: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn race_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 12).unwrap()
    }

    fn request() -> CreateParticipantRequest {
        CreateParticipantRequest {
            first_name: " Lucía ".to_string(),
            last_name: "Gómez".to_string(),
            dni: Some("30.123.456".to_string()),
            sex: Some(Sex::Female),
            birth_date: NaiveDate::from_ymd_opt(1990, 10, 13),
            age: Some(99),
            distance_km: Some(Decimal::from(21)),
            bib_number: Some(" 101 ".to_string()),
            chip: Some(" A-0101 ".to_string()),
        }
    }

    fn stored() -> Participant {
        Participant {
            participant_id: Uuid::from_u128(1),
            race_id: Uuid::from_u128(2),
            first_name: "Lucía".to_string(),
            last_name: "Gómez".to_string(),
            dni: Some("30123456".to_string()),
            sex: Some(Sex::Female),
            birth_date: None,
            age: Some(34),
            distance_km: Some(Decimal::from(21)),
            bib_number: Some("101".to_string()),
            chip: Some("A-0101".to_string()),
            chip_delivered: true,
            kit_delivered: false,
            category_id: Some(Uuid::from_u128(9)),
            created_at: chrono::NaiveDateTime::default(),
        }
    }

    #[test]
    fn test_birth_date_wins_over_given_age() {
        let new = request().into_new_participant(race_day()).unwrap();
        assert_eq!(new.age, Some(34));
        assert_eq!(new.first_name, "Lucía");
        assert_eq!(new.dni.as_deref(), Some("30123456"));
        assert_eq!(new.bib_number.as_deref(), Some("101"));
        assert_eq!(new.chip.as_deref(), Some("A-0101"));
        assert_eq!(new.category_id, None);
    }

    #[test]
    fn test_distance_is_stored_with_three_decimals() {
        let mut req = request();
        req.distance_km = Some(Decimal::new(210_975, 4));
        let new = req.into_new_participant(race_day()).unwrap();
        assert_eq!(new.distance_km, Some(Decimal::new(21_098, 3)));

        let mut req = request();
        req.distance_km = Some(Decimal::from(100_000));
        assert!(req.into_new_participant(race_day()).is_err());
    }

    #[test]
    fn test_implausible_birth_date_is_rejected() {
        let mut req = request();
        req.birth_date = NaiveDate::from_ymd_opt(2030, 1, 1);
        assert!(req.into_new_participant(race_day()).is_err());
    }

    #[test]
    fn test_dni_validation() {
        assert!(validate_dni("30.123.456").is_ok());
        assert!(validate_dni("30123456").is_ok());
        assert!(validate_dni("ABC123").is_err());
        assert!(validate_dni("123").is_err());
    }

    #[test]
    fn test_update_keeps_category_when_absent() {
        let update: UpdateParticipantRequest =
            serde_json::from_str(r#"{"first_name": "Lu"}"#).unwrap();
        let merged = update.merge(&stored(), race_day()).unwrap();

        assert_eq!(merged.first_name, "Lu");
        assert_eq!(merged.category_id, Some(Uuid::from_u128(9)));
        assert_eq!(merged.age, Some(34));
        assert_eq!(merged.chip.as_deref(), Some("A-0101"));
    }

    #[test]
    fn test_update_null_category_clears_it() {
        let update: UpdateParticipantRequest =
            serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        let merged = update.merge(&stored(), race_day()).unwrap();

        assert_eq!(merged.category_id, None);
    }

    #[test]
    fn test_update_birth_date_recomputes_age() {
        let update = UpdateParticipantRequest {
            birth_date: NaiveDate::from_ymd_opt(1980, 1, 1),
            ..Default::default()
        };
        let merged = update.merge(&stored(), race_day()).unwrap();

        assert_eq!(merged.age, Some(45));
    }
}
