//! Reduces timing punches to one best finish per participant.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::results::ResultsBoard;
use crate::models::{ParseEnumError, PunchKind, Sex};
use crate::repository::{race::RaceRepository, timelog::TimelogRepository};

/// Display fields of the participant behind a punch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ParticipantSummary {
    pub participant_id: Uuid,
    pub bib_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub sex: Option<Sex>,
    pub distance_km: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
}

/// A timelog joined with its participant. `participant` is `None` when the
/// participant row no longer exists.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingPunch {
    pub timelog_id: Uuid,
    pub kind: PunchKind,
    pub elapsed_ms: i64,
    pub participant: Option<ParticipantSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RankedResult {
    pub participant: ParticipantSummary,
    pub best_elapsed_ms: i64,
}

/// One best finish per participant, fastest first.
///
/// Non-finish punches and punches without a resolvable participant are
/// dropped. Equal times keep the order in which they were first seen.
pub fn rank_results(punches: &[TimingPunch]) -> Vec<RankedResult> {
    let mut best: Vec<RankedResult> = Vec::new();
    let mut slot_of: HashMap<Uuid, usize> = HashMap::new();

    for punch in punches {
        if punch.kind != PunchKind::Finish {
            continue;
        }
        let Some(participant) = &punch.participant else {
            continue;
        };

        match slot_of.get(&participant.participant_id) {
            Some(&slot) => {
                if punch.elapsed_ms < best[slot].best_elapsed_ms {
                    best[slot] = RankedResult {
                        participant: participant.clone(),
                        best_elapsed_ms: punch.elapsed_ms,
                    };
                }
            }
            None => {
                slot_of.insert(participant.participant_id, best.len());
                best.push(RankedResult {
                    participant: participant.clone(),
                    best_elapsed_ms: punch.elapsed_ms,
                });
            }
        }
    }

    best.sort_by_key(|result| result.best_elapsed_ms);
    best
}

/// Which results to keep. `ALL` keeps everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Category(Uuid),
}

impl CategoryFilter {
    pub fn admits(&self, category_id: Option<Uuid>) -> bool {
        match self {
            Self::All => true,
            Self::Category(id) => category_id == Some(*id),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Category(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "ALL" {
            return Ok(Self::All);
        }
        s.parse::<Uuid>()
            .map(Self::Category)
            .map_err(|_| ParseEnumError {
                kind: "category filter",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for CategoryFilter {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Keeps the results admitted by `filter`, preserving their order.
pub fn filter_by_category(results: Vec<RankedResult>, filter: CategoryFilter) -> Vec<RankedResult> {
    if filter == CategoryFilter::All {
        return results;
    }

    results
        .into_iter()
        .filter(|result| filter.admits(result.participant.category_id))
        .collect()
}

/// Ranked finishers of a race, optionally narrowed to one category.
pub async fn results_board(
    pool: &PgPool,
    race_id: Uuid,
    filter: CategoryFilter,
) -> crate::error::Result<ResultsBoard> {
    RaceRepository::new(pool).find_by_id(race_id).await?;

    let punches = TimelogRepository::new(pool).finish_punches(race_id).await?;
    let ranked = filter_by_category(rank_results(&punches), filter);

    Ok(ResultsBoard::new(race_id, filter, ranked))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(pid: u128, category: Option<u128>) -> ParticipantSummary {
        ParticipantSummary {
            participant_id: Uuid::from_u128(pid),
            bib_number: Some(pid.to_string()),
            first_name: format!("Runner{pid}"),
            last_name: "Test".to_string(),
            sex: Some(Sex::Female),
            distance_km: Some(Decimal::from(10)),
            category_id: category.map(Uuid::from_u128),
            category_name: category.map(|c| format!("cat-{c}")),
        }
    }

    fn punch(pid: u128, kind: PunchKind, elapsed_ms: i64) -> TimingPunch {
        TimingPunch {
            timelog_id: Uuid::new_v4(),
            kind,
            elapsed_ms,
            participant: Some(summary(pid, None)),
        }
    }

    fn ids(results: &[RankedResult]) -> Vec<Uuid> {
        results.iter().map(|r| r.participant.participant_id).collect()
    }

    #[test]
    fn test_empty_punches_give_empty_results() {
        assert!(rank_results(&[]).is_empty());
    }

    #[test]
    fn test_best_time_per_participant() {
        let punches = vec![
            punch(1, PunchKind::Finish, 5000),
            punch(1, PunchKind::Finish, 3000),
            punch(2, PunchKind::Finish, 4000),
        ];

        let results = rank_results(&punches);

        assert_eq!(results.len(), 2);
        assert_eq!(ids(&results), vec![Uuid::from_u128(1), Uuid::from_u128(2)]);
        assert_eq!(results[0].best_elapsed_ms, 3000);
        assert_eq!(results[1].best_elapsed_ms, 4000);
    }

    #[test]
    fn test_non_finish_punches_are_ignored() {
        assert!(rank_results(&[punch(1, PunchKind::Start, 100)]).is_empty());

        let punches = vec![
            punch(1, PunchKind::Split, 100),
            punch(1, PunchKind::Finish, 9000),
        ];
        let results = rank_results(&punches);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].best_elapsed_ms, 9000);
    }

    #[test]
    fn test_orphan_punches_are_skipped() {
        let mut orphan = punch(7, PunchKind::Finish, 1);
        orphan.participant = None;

        let results = rank_results(&[orphan, punch(2, PunchKind::Finish, 4000)]);

        assert_eq!(ids(&results), vec![Uuid::from_u128(2)]);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let punches = vec![
            punch(3, PunchKind::Finish, 4000),
            punch(1, PunchKind::Finish, 4000),
            punch(2, PunchKind::Finish, 3500),
        ];

        let results = rank_results(&punches);

        assert_eq!(
            ids(&results),
            vec![Uuid::from_u128(2), Uuid::from_u128(3), Uuid::from_u128(1)]
        );
    }

    #[test]
    fn test_filter_all_is_identity() {
        let results = rank_results(&[
            punch(2, PunchKind::Finish, 2000),
            punch(1, PunchKind::Finish, 1000),
        ]);
        let before = results.clone();

        assert_eq!(filter_by_category(results, CategoryFilter::All), before);
    }

    #[test]
    fn test_filter_by_category_keeps_order() {
        let mut punches = vec![
            punch(1, PunchKind::Finish, 1000),
            punch(2, PunchKind::Finish, 2000),
            punch(3, PunchKind::Finish, 3000),
        ];
        punches[0].participant = Some(summary(1, Some(10)));
        punches[2].participant = Some(summary(3, Some(10)));
        punches[1].participant = Some(summary(2, Some(11)));

        let filtered = filter_by_category(
            rank_results(&punches),
            CategoryFilter::Category(Uuid::from_u128(10)),
        );

        assert_eq!(ids(&filtered), vec![Uuid::from_u128(1), Uuid::from_u128(3)]);
    }

    #[test]
    fn test_category_board_gaps_follow_category_leader() {
        let mut punches = vec![
            punch(1, PunchKind::Finish, 1000),
            punch(2, PunchKind::Finish, 2000),
            punch(3, PunchKind::Finish, 3500),
        ];
        punches[0].participant = Some(summary(1, Some(10)));
        punches[1].participant = Some(summary(2, Some(11)));
        punches[2].participant = Some(summary(3, Some(11)));

        let filter = CategoryFilter::Category(Uuid::from_u128(11));
        let board = ResultsBoard::new(
            Uuid::nil(),
            filter,
            filter_by_category(rank_results(&punches), filter),
        );

        assert_eq!(board.category, Uuid::from_u128(11).to_string());
        assert_eq!(board.entries.len(), 2);

        let first = &board.entries[0];
        assert_eq!(first.position, 1);
        assert_eq!(first.participant_id, Uuid::from_u128(2));
        assert_eq!(first.elapsed_ms, 2000);
        assert_eq!(first.gap, "00:00:00.000");

        let second = &board.entries[1];
        assert_eq!(second.position, 2);
        assert_eq!(second.elapsed_ms, 3500);
        assert_eq!(second.gap_ms, 1500);
        assert_eq!(second.gap, "00:00:01.500");
    }

    #[test]
    fn test_uncategorized_results_only_pass_all() {
        let results = rank_results(&[punch(1, PunchKind::Finish, 1000)]);
        let filtered = filter_by_category(results, CategoryFilter::Category(Uuid::from_u128(10)));
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_category_filter_parsing() {
        assert_eq!("ALL".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        let id = Uuid::from_u128(42);
        assert_eq!(
            id.to_string().parse::<CategoryFilter>(),
            Ok(CategoryFilter::Category(id))
        );
        assert!("all".parse::<CategoryFilter>().is_err());
        assert!("12".parse::<CategoryFilter>().is_err());
    }
}
