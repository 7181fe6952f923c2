use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::common::{normalize_distance, present};
use crate::models::{Category, Sex};

pub const DEFAULT_NAME_TEMPLATE: &str = "[[distance]]K [[sex]] [[age_min]]-[[age_max]]";

/// Category fields ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub distance_km: Decimal,
    pub sex: Sex,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub is_active: bool,
}

impl NewCategory {
    fn dedup_key(&self) -> (Decimal, Sex, Option<i32>, Option<i32>) {
        (self.distance_km.normalize(), self.sex, self.age_min, self.age_max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    pub distance_km: Decimal,

    pub sex: Sex,

    #[validate(range(min = 0, max = 200))]
    pub age_min: Option<i32>,

    #[validate(range(min = 0, max = 200))]
    pub age_max: Option<i32>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl CreateCategoryRequest {
    /// Checks the distance and age bounds, then builds the row to insert
    /// with the distance rounded to stored precision.
    pub fn into_new_category(self) -> Result<NewCategory, String> {
        let distance_km = normalize_distance(self.distance_km)?;
        validate_age_range(self.age_min, self.age_max)?;

        Ok(NewCategory {
            name: self.name.trim().to_string(),
            distance_km,
            sex: self.sex,
            age_min: self.age_min,
            age_max: self.age_max,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub distance_km: Option<Decimal>,

    pub sex: Option<Sex>,

    /// Absent keeps the bound, `null` removes it.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i32>)]
    #[validate(range(min = 0, max = 200))]
    pub age_min: Option<Option<i32>>,

    /// Absent keeps the bound, `null` removes it.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i32>)]
    #[validate(range(min = 0, max = 200))]
    pub age_max: Option<Option<i32>>,

    pub is_active: Option<bool>,
}

impl UpdateCategoryRequest {
    /// Applies the update on top of `existing` and checks the merged bounds.
    pub fn merge(&self, existing: &Category) -> Result<NewCategory, String> {
        let merged = NewCategory {
            name: self
                .name
                .as_ref()
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| existing.name.clone()),
            distance_km: match self.distance_km {
                Some(km) => normalize_distance(km)?,
                None => existing.distance_km,
            },
            sex: self.sex.unwrap_or(existing.sex),
            age_min: self.age_min.unwrap_or(existing.age_min),
            age_max: self.age_max.unwrap_or(existing.age_max),
            is_active: self.is_active.unwrap_or(existing.is_active),
        };

        validate_age_range(merged.age_min, merged.age_max)?;
        Ok(merged)
    }
}

fn validate_age_range(age_min: Option<i32>, age_max: Option<i32>) -> Result<(), String> {
    if let (Some(min), Some(max)) = (age_min, age_max)
        && min > max
    {
        return Err(format!("age_min ({min}) must be <= age_max ({max})"));
    }
    Ok(())
}

/// An inclusive age bracket written as `"18-29"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeRange {
    pub min: i32,
    pub max: i32,
}

impl FromStr for AgeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid age range '{s}', expected a format like 18-29");

        let (min, max) = s.split_once('-').ok_or_else(invalid)?;
        let min: i32 = min.trim().parse().map_err(|_| invalid())?;
        let max: i32 = max.trim().parse().map_err(|_| invalid())?;

        if min < 0 || max < min {
            return Err(format!("Invalid age range '{s}'"));
        }

        Ok(Self { min, max })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SexLabel {
    /// `M`, `F`, `X`, `ALL`
    #[default]
    Code,
    /// `MALE`, `FEMALE`, ...
    Long,
}

/// Creates every combination of distance, age range and sex in one go.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkCreateCategoriesRequest {
    #[validate(length(min = 1, message = "At least one distance is required"))]
    pub distances: Vec<Decimal>,

    #[validate(length(min = 1, message = "At least one age range is required"))]
    pub age_ranges: Vec<String>,

    #[validate(length(min = 1, message = "At least one sex is required"))]
    pub sexes: Vec<Sex>,

    /// Supports `[[distance]]`, `[[sex]]`, `[[age_min]]` and `[[age_max]]`.
    #[serde(default = "default_template")]
    pub name_template: String,

    #[serde(default)]
    pub sex_label: SexLabel,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_template() -> String {
    DEFAULT_NAME_TEMPLATE.to_string()
}

impl BulkCreateCategoriesRequest {
    /// Expands the request into new categories, leaving out combinations that
    /// already exist in `existing` or repeat within the request. Returns the
    /// rows together with the number of combinations left out.
    pub fn expand(&self, existing: &[Category]) -> Result<(Vec<NewCategory>, usize), String> {
        let ranges = self
            .age_ranges
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(AgeRange::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        if ranges.is_empty() {
            return Err("At least one age range is required".to_string());
        }

        let mut seen: HashSet<_> = existing.iter().map(Category::dedup_key).collect();
        let mut rows = Vec::new();
        let mut skipped = 0;

        for &distance in &self.distances {
            let distance = normalize_distance(distance)?;

            for range in &ranges {
                for &sex in &self.sexes {
                    let name = self.render_name(distance, sex, range);
                    if name.is_empty() {
                        return Err(format!(
                            "Name template produced an empty name for {} / {} / {}-{}",
                            distance.normalize(),
                            sex,
                            range.min,
                            range.max
                        ));
                    }

                    let row = NewCategory {
                        name,
                        distance_km: distance,
                        sex,
                        age_min: Some(range.min),
                        age_max: Some(range.max),
                        is_active: self.is_active,
                    };

                    if seen.insert(row.dedup_key()) {
                        rows.push(row);
                    } else {
                        skipped += 1;
                    }
                }
            }
        }

        Ok((rows, skipped))
    }

    fn render_name(&self, distance: Decimal, sex: Sex, range: &AgeRange) -> String {
        let sex = match self.sex_label {
            SexLabel::Code => sex.as_str(),
            SexLabel::Long => sex.label(),
        };

        self.name_template
            .replace("[[distance]]", &distance.normalize().to_string())
            .replace("[[sex]]", sex)
            .replace("[[age_min]]", &range.min.to_string())
            .replace("[[age_max]]", &range.max.to_string())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkCreateCategoriesResponse {
    pub created: Vec<Category>,
    /// Combinations left out because they already existed.
    pub skipped: usize,
}
