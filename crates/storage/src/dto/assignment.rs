use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryChange {
    pub participant_id: Uuid,
    pub from: Option<Uuid>,
    pub to: Option<Uuid>,
}

/// A participant that fit more than one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AmbiguousAssignment {
    pub participant_id: Uuid,
    pub chosen_category_id: Uuid,
    pub contender_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AssignmentFailure {
    pub participant_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecalculationReport {
    pub race_id: Uuid,
    pub dry_run: bool,
    pub examined: usize,
    /// Participants missing sex, age or distance; left untouched.
    pub skipped: usize,
    pub unchanged: usize,
    pub updated: usize,
    /// Participants no active category fits.
    pub uncategorized: Vec<Uuid>,
    pub ambiguous: Vec<AmbiguousAssignment>,
    /// Changes computed but not written (dry runs only).
    pub pending: Vec<CategoryChange>,
    pub failures: Vec<AssignmentFailure>,
}

impl RecalculationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct RecalculateQuery {
    #[serde(default)]
    pub dry_run: bool,
}
