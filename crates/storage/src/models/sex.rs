use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sex of a runner, or the sex filter of a category.
///
/// `All` on a category accepts every runner. Stored in canonical uppercase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "varchar")]
pub enum Sex {
    #[serde(rename = "M")]
    #[sqlx(rename = "M")]
    Male,
    #[serde(rename = "F")]
    #[sqlx(rename = "F")]
    Female,
    #[serde(rename = "X")]
    #[sqlx(rename = "X")]
    NonBinary,
    #[serde(rename = "ALL")]
    #[sqlx(rename = "ALL")]
    All,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::NonBinary => "X",
            Self::All => "ALL",
        }
    }

    /// Long label used when generating category names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::NonBinary => "NON-BINARY",
            Self::All => "OPEN",
        }
    }

    /// Whether a category with this filter admits a runner of sex `runner`.
    pub fn admits(&self, runner: Sex) -> bool {
        *self == Self::All || *self == runner
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_case_sensitive() {
        assert_eq!(serde_json::from_str::<Sex>("\"F\"").unwrap(), Sex::Female);
        assert!(serde_json::from_str::<Sex>("\"f\"").is_err());
        assert!(serde_json::from_str::<Sex>("\"any\"").is_err());
    }

    #[test]
    fn test_stored_as_varchar() {
        use sqlx::{Postgres, Type, TypeInfo};

        assert_eq!(<Sex as Type<Postgres>>::type_info().name(), "varchar");
    }

    #[test]
    fn test_all_admits_everyone() {
        assert!(Sex::All.admits(Sex::Male));
        assert!(Sex::All.admits(Sex::NonBinary));
        assert!(Sex::Female.admits(Sex::Female));
        assert!(!Sex::Female.admits(Sex::Male));
        assert!(!Sex::Male.admits(Sex::All));
    }

    #[test]
    fn test_serde_uses_canonical_codes() {
        assert_eq!(serde_json::to_string(&Sex::All).unwrap(), "\"ALL\"");
        let parsed: Sex = serde_json::from_str("\"X\"").unwrap();
        assert_eq!(parsed, Sex::NonBinary);
    }
}
