//! Category matching and the bulk "recalculate categories" job.
//!
//! A participant's `category_id` is a cached value derived from sex, age and
//! distance. It is only refreshed when [`recalculate_categories`] runs (or when
//! a participant is created), never kept in sync automatically.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::assignment::{
    AmbiguousAssignment, AssignmentFailure, CategoryChange, RecalculationReport,
};
use crate::error::Result;
use crate::models::{Category, Participant, Sex};
use crate::repository::category::CategoryRepository;
use crate::repository::participant::ParticipantRepository;

/// The three facts category matching looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Runner {
    pub sex: Sex,
    pub age: i32,
    pub distance_km: Decimal,
}

impl Runner {
    /// `None` when the participant lacks sex, age or distance; such
    /// participants are left alone rather than uncategorized.
    pub fn from_participant(participant: &Participant) -> Option<Self> {
        Some(Self {
            sex: participant.sex?,
            age: participant.age?,
            distance_km: participant.distance_km?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CategoryMatch<'a> {
    Unmatched,
    Unique(&'a Category),
    /// Several categories overlap. `chosen` has the narrowest age span, the
    /// earliest in candidate order among equals. `contenders` lists every
    /// match, `chosen` included.
    Ambiguous {
        chosen: &'a Category,
        contenders: Vec<&'a Category>,
    },
}

impl<'a> CategoryMatch<'a> {
    pub fn chosen(&self) -> Option<&'a Category> {
        match self {
            Self::Unmatched => None,
            Self::Unique(category) => Some(category),
            Self::Ambiguous { chosen, .. } => Some(chosen),
        }
    }
}

/// Whether `category` accepts `runner`: active, same distance, compatible sex
/// and age within the inclusive bounds.
pub fn accepts(category: &Category, runner: &Runner) -> bool {
    category.is_active
        && category.distance_km == runner.distance_km
        && category.sex.admits(runner.sex)
        && category.admits_age(runner.age)
}

pub fn match_category<'a>(runner: &Runner, candidates: &'a [Category]) -> CategoryMatch<'a> {
    let contenders: Vec<&Category> = candidates
        .iter()
        .filter(|category| accepts(category, runner))
        .collect();

    match contenders.len() {
        0 => CategoryMatch::Unmatched,
        1 => CategoryMatch::Unique(contenders[0]),
        _ => {
            // min_by_key keeps the first of equal minima
            let chosen = contenders
                .iter()
                .copied()
                .min_by_key(|category| category.age_span())
                .unwrap_or(contenders[0]);

            CategoryMatch::Ambiguous { chosen, contenders }
        }
    }
}

/// Best category for `runner`, or `None` when nothing fits.
pub fn assign_category<'a>(runner: &Runner, candidates: &'a [Category]) -> Option<&'a Category> {
    match_category(runner, candidates).chosen()
}

/// Outcome of matching every participant of a race, before anything is written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentPlan {
    pub examined: usize,
    pub skipped: Vec<Uuid>,
    pub unchanged: usize,
    pub changes: Vec<CategoryChange>,
    pub uncategorized: Vec<Uuid>,
    pub ambiguous: Vec<AmbiguousAssignment>,
}

pub fn plan_assignments(categories: &[Category], participants: &[Participant]) -> AssignmentPlan {
    let mut plan = AssignmentPlan::default();

    for participant in participants {
        plan.examined += 1;

        let Some(runner) = Runner::from_participant(participant) else {
            plan.skipped.push(participant.participant_id);
            continue;
        };

        let outcome = match_category(&runner, categories);

        if let CategoryMatch::Ambiguous { chosen, contenders } = &outcome {
            tracing::debug!(
                participant_id = %participant.participant_id,
                chosen = %chosen.category_id,
                contenders = contenders.len(),
                "Overlapping categories, picked narrowest age span"
            );
            plan.ambiguous.push(AmbiguousAssignment {
                participant_id: participant.participant_id,
                chosen_category_id: chosen.category_id,
                contender_ids: contenders.iter().map(|c| c.category_id).collect(),
            });
        }

        let target = outcome.chosen().map(|category| category.category_id);
        if target.is_none() {
            plan.uncategorized.push(participant.participant_id);
        }

        if target == participant.category_id {
            plan.unchanged += 1;
        } else {
            plan.changes.push(CategoryChange {
                participant_id: participant.participant_id,
                from: participant.category_id,
                to: target,
            });
        }
    }

    plan
}

/// Data access needed by the recalculation job.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Active categories of a race, in a stable order.
    async fn active_categories(&self, race_id: Uuid) -> Result<Vec<Category>>;

    async fn participants(&self, race_id: Uuid) -> Result<Vec<Participant>>;

    async fn set_category(&self, participant_id: Uuid, category_id: Option<Uuid>) -> Result<()>;
}

pub struct PgAssignmentStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgAssignmentStore<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentStore for PgAssignmentStore<'_> {
    async fn active_categories(&self, race_id: Uuid) -> Result<Vec<Category>> {
        CategoryRepository::new(self.pool)
            .list_active_by_race(race_id)
            .await
    }

    async fn participants(&self, race_id: Uuid) -> Result<Vec<Participant>> {
        ParticipantRepository::new(self.pool).list_by_race(race_id).await
    }

    async fn set_category(&self, participant_id: Uuid, category_id: Option<Uuid>) -> Result<()> {
        ParticipantRepository::new(self.pool)
            .set_category(participant_id, category_id)
            .await
    }
}

/// Recomputes `category_id` for every participant of a race.
///
/// Each change is written as its own single-row update. A failed update is
/// recorded in the report and the job moves on. Two runs racing on the same
/// race resolve as last write wins. With `dry_run` nothing is written.
pub async fn recalculate_categories<S>(
    store: &S,
    race_id: Uuid,
    dry_run: bool,
) -> Result<RecalculationReport>
where
    S: AssignmentStore + ?Sized,
{
    let categories = store.active_categories(race_id).await?;
    let participants = store.participants(race_id).await?;

    let plan = plan_assignments(&categories, &participants);

    let mut report = RecalculationReport {
        race_id,
        dry_run,
        examined: plan.examined,
        skipped: plan.skipped.len(),
        unchanged: plan.unchanged,
        updated: 0,
        uncategorized: plan.uncategorized,
        ambiguous: plan.ambiguous,
        pending: Vec::new(),
        failures: Vec::new(),
    };

    if dry_run {
        report.pending = plan.changes;
        return Ok(report);
    }

    for change in plan.changes {
        match store.set_category(change.participant_id, change.to).await {
            Ok(()) => report.updated += 1,
            Err(e) => {
                tracing::warn!(
                    participant_id = %change.participant_id,
                    "Failed to update category: {}",
                    e
                );
                report.failures.push(AssignmentFailure {
                    participant_id: change.participant_id,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        %race_id,
        examined = report.examined,
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failures.len(),
        "Category recalculation finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;
    use crate::error::StorageError;

    fn race() -> Uuid {
        Uuid::from_u128(1)
    }

    fn category(id: u128, km: i64, sex: Sex, min: Option<i32>, max: Option<i32>) -> Category {
        Category {
            category_id: Uuid::from_u128(id),
            race_id: race(),
            name: format!("cat-{id}"),
            distance_km: Decimal::from(km),
            sex,
            age_min: min,
            age_max: max,
            is_active: true,
            created_at: chrono::NaiveDateTime::default(),
        }
    }

    fn participant(id: u128, sex: Option<Sex>, age: Option<i32>, km: Option<i64>) -> Participant {
        Participant {
            participant_id: Uuid::from_u128(id),
            race_id: race(),
            first_name: "Ana".to_string(),
            last_name: "Pérez".to_string(),
            dni: None,
            sex,
            birth_date: None,
            age,
            distance_km: km.map(Decimal::from),
            bib_number: None,
            chip: None,
            chip_delivered: false,
            kit_delivered: false,
            category_id: None,
            created_at: chrono::NaiveDateTime::default(),
        }
    }

    fn runner(sex: Sex, age: i32, km: i64) -> Runner {
        Runner {
            sex,
            age,
            distance_km: Decimal::from(km),
        }
    }

    #[test]
    fn test_single_match_is_returned() {
        let cats = vec![
            category(10, 10, Sex::Male, Some(18), Some(29)),
            category(11, 10, Sex::Female, Some(18), Some(29)),
            category(12, 21, Sex::Male, Some(18), Some(29)),
        ];

        let chosen = assign_category(&runner(Sex::Female, 25, 10), &cats);
        assert_eq!(chosen.map(|c| c.category_id), Some(Uuid::from_u128(11)));
    }

    #[test]
    fn test_no_match_returns_none() {
        let cats = vec![category(10, 10, Sex::Male, Some(18), Some(29))];
        assert_eq!(assign_category(&runner(Sex::Male, 40, 10), &cats), None);
        assert_eq!(assign_category(&runner(Sex::Male, 20, 5), &cats), None);
        assert_eq!(assign_category(&runner(Sex::Male, 20, 10), &[]), None);
    }

    #[test]
    fn test_inactive_categories_are_ignored() {
        let mut cat = category(10, 10, Sex::All, None, None);
        cat.is_active = false;
        assert_eq!(assign_category(&runner(Sex::Male, 30, 10), &[cat]), None);
    }

    #[test]
    fn test_age_bounds_are_inclusive() {
        let cats = vec![category(10, 10, Sex::All, Some(18), Some(29))];

        assert!(assign_category(&runner(Sex::Male, 18, 10), &cats).is_some());
        assert!(assign_category(&runner(Sex::Male, 29, 10), &cats).is_some());
        assert!(assign_category(&runner(Sex::Male, 17, 10), &cats).is_none());
        assert!(assign_category(&runner(Sex::Male, 30, 10), &cats).is_none());
    }

    #[test]
    fn test_missing_bound_is_unconstrained() {
        let cats = vec![category(10, 10, Sex::All, Some(60), None)];
        assert!(assign_category(&runner(Sex::Female, 95, 10), &cats).is_some());
        assert!(assign_category(&runner(Sex::Female, 59, 10), &cats).is_none());
    }

    #[test]
    fn test_distance_equality_ignores_scale() {
        let mut cat = category(10, 0, Sex::All, None, None);
        cat.distance_km = Decimal::new(10_000, 3);
        assert!(assign_category(&runner(Sex::Male, 30, 10), &[cat]).is_some());
    }

    #[test]
    fn test_distance_has_no_tolerance() {
        let mut cat = category(10, 0, Sex::All, None, None);
        cat.distance_km = Decimal::new(105, 1);
        assert!(assign_category(&runner(Sex::Male, 30, 10), &[cat]).is_none());
    }

    #[test]
    fn test_all_filter_matches_any_sex_but_specific_filter_does_not() {
        let cats = vec![category(10, 10, Sex::Male, None, None)];
        assert!(assign_category(&runner(Sex::NonBinary, 30, 10), &cats).is_none());

        let cats = vec![category(11, 10, Sex::All, None, None)];
        assert!(assign_category(&runner(Sex::NonBinary, 30, 10), &cats).is_some());
    }

    #[test]
    fn test_overlap_prefers_narrowest_age_span() {
        let cats = vec![
            category(20, 10, Sex::All, Some(20), Some(40)),
            category(21, 10, Sex::Male, Some(25), Some(35)),
        ];

        let outcome = match_category(&runner(Sex::Male, 30, 10), &cats);
        match outcome {
            CategoryMatch::Ambiguous { chosen, contenders } => {
                assert_eq!(chosen.category_id, Uuid::from_u128(21));
                assert_eq!(contenders.len(), 2);
            }
            other => panic!("expected ambiguous match, got {other:?}"),
        }
    }

    #[test]
    fn test_open_bounds_count_as_widest_span() {
        let cats = vec![
            category(30, 10, Sex::All, None, None),
            category(31, 10, Sex::All, Some(0), Some(150)),
        ];

        let chosen = assign_category(&runner(Sex::Female, 30, 10), &cats);
        assert_eq!(chosen.map(|c| c.category_id), Some(Uuid::from_u128(31)));
    }

    #[test]
    fn test_equal_spans_resolve_to_first_candidate() {
        let cats = vec![
            category(40, 10, Sex::All, Some(20), Some(30)),
            category(41, 10, Sex::Male, Some(25), Some(35)),
        ];

        let chosen = assign_category(&runner(Sex::Male, 27, 10), &cats);
        assert_eq!(chosen.map(|c| c.category_id), Some(Uuid::from_u128(40)));

        let reversed: Vec<Category> = cats.into_iter().rev().collect();
        let chosen = assign_category(&runner(Sex::Male, 27, 10), &reversed);
        assert_eq!(chosen.map(|c| c.category_id), Some(Uuid::from_u128(41)));
    }

    #[test]
    fn test_every_assignment_satisfies_the_match_predicate() {
        let mut retired = category(55, 10, Sex::All, None, None);
        retired.is_active = false;
        let cats = vec![
            category(50, 5, Sex::Male, Some(18), Some(39)),
            category(51, 5, Sex::Female, Some(18), Some(39)),
            category(52, 5, Sex::All, Some(40), None),
            category(53, 10, Sex::All, None, Some(17)),
            category(54, 10, Sex::NonBinary, Some(18), Some(99)),
            retired,
        ];

        for sex in [Sex::Male, Sex::Female, Sex::NonBinary, Sex::All] {
            for km in [5, 10, 21] {
                for age in 0..=110 {
                    let r = runner(sex, age, km);
                    let matching = cats.iter().filter(|c| accepts(c, &r)).count();

                    match assign_category(&r, &cats) {
                        Some(chosen) => {
                            assert!(chosen.is_active);
                            assert_eq!(chosen.distance_km, r.distance_km);
                            assert!(chosen.sex == Sex::All || chosen.sex == r.sex);
                            assert!(chosen.admits_age(r.age));
                        }
                        None => assert_eq!(matching, 0, "{r:?} matched but got None"),
                    }
                }
            }
        }
    }

    #[test]
    fn test_plan_skips_participants_missing_data() {
        let cats = vec![category(10, 10, Sex::All, None, None)];
        let mut stale = participant(3, None, Some(30), Some(10));
        stale.category_id = Some(Uuid::from_u128(99));
        let people = vec![
            participant(1, Some(Sex::Male), None, Some(10)),
            participant(2, Some(Sex::Male), Some(30), None),
            stale,
        ];

        let plan = plan_assignments(&cats, &people);

        assert_eq!(plan.examined, 3);
        assert_eq!(plan.skipped.len(), 3);
        assert!(plan.changes.is_empty());
    }

    #[test]
    fn test_plan_clears_category_when_nothing_matches() {
        let cats = vec![category(10, 10, Sex::All, Some(18), Some(29))];
        let mut p = participant(1, Some(Sex::Female), Some(45), Some(10));
        p.category_id = Some(Uuid::from_u128(10));

        let plan = plan_assignments(&cats, &[p]);

        assert_eq!(
            plan.changes,
            vec![CategoryChange {
                participant_id: Uuid::from_u128(1),
                from: Some(Uuid::from_u128(10)),
                to: None,
            }]
        );
        assert_eq!(plan.uncategorized, vec![Uuid::from_u128(1)]);
    }

    #[derive(Default)]
    struct MemoryStore {
        categories: Vec<Category>,
        participants: Mutex<Vec<Participant>>,
        rejected: HashSet<Uuid>,
        writes: Mutex<usize>,
    }

    impl MemoryStore {
        fn category_of(&self, id: u128) -> Option<Uuid> {
            self.participants
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.participant_id == Uuid::from_u128(id))
                .and_then(|p| p.category_id)
        }
    }

    #[async_trait]
    impl AssignmentStore for MemoryStore {
        async fn active_categories(&self, _race_id: Uuid) -> Result<Vec<Category>> {
            Ok(self.categories.iter().filter(|c| c.is_active).cloned().collect())
        }

        async fn participants(&self, _race_id: Uuid) -> Result<Vec<Participant>> {
            Ok(self.participants.lock().unwrap().clone())
        }

        async fn set_category(
            &self,
            participant_id: Uuid,
            category_id: Option<Uuid>,
        ) -> Result<()> {
            if self.rejected.contains(&participant_id) {
                return Err(StorageError::ConstraintViolation("write rejected".into()));
            }
            *self.writes.lock().unwrap() += 1;
            let mut participants = self.participants.lock().unwrap();
            let row = participants
                .iter_mut()
                .find(|p| p.participant_id == participant_id)
                .ok_or(StorageError::NotFound)?;
            row.category_id = category_id;
            Ok(())
        }
    }

    fn sample_store() -> MemoryStore {
        MemoryStore {
            categories: vec![
                category(10, 10, Sex::Male, Some(18), Some(39)),
                category(11, 10, Sex::Female, Some(18), Some(39)),
                category(12, 10, Sex::All, Some(40), None),
            ],
            participants: Mutex::new(vec![
                participant(1, Some(Sex::Male), Some(25), Some(10)),
                participant(2, Some(Sex::Female), Some(52), Some(10)),
                participant(3, Some(Sex::Female), Some(30), Some(21)),
                participant(4, None, Some(30), Some(10)),
            ]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_recalculation_assigns_and_reports() {
        let store = sample_store();

        let report = recalculate_categories(&store, race(), false).await.unwrap();

        assert_eq!(report.examined, 4);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.updated, 2);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.uncategorized, vec![Uuid::from_u128(3)]);
        assert!(report.failures.is_empty());
        assert_eq!(store.category_of(1), Some(Uuid::from_u128(10)));
        assert_eq!(store.category_of(2), Some(Uuid::from_u128(12)));
        assert_eq!(store.category_of(4), None);
    }

    #[tokio::test]
    async fn test_recalculation_is_idempotent() {
        let store = sample_store();

        recalculate_categories(&store, race(), false).await.unwrap();
        let first: Vec<Option<Uuid>> = (1..=4).map(|id| store.category_of(id)).collect();
        let writes_after_first = *store.writes.lock().unwrap();

        let second = recalculate_categories(&store, race(), false).await.unwrap();
        let again: Vec<Option<Uuid>> = (1..=4).map(|id| store.category_of(id)).collect();

        assert_eq!(first, again);
        assert_eq!(second.updated, 0);
        assert_eq!(*store.writes.lock().unwrap(), writes_after_first);
    }

    #[tokio::test]
    async fn test_failed_write_does_not_stop_the_batch() {
        let mut store = sample_store();
        store.rejected.insert(Uuid::from_u128(1));

        let report = recalculate_categories(&store, race(), false).await.unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].participant_id, Uuid::from_u128(1));
        assert_eq!(store.category_of(1), None);
        assert_eq!(store.category_of(2), Some(Uuid::from_u128(12)));
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let store = sample_store();

        let report = recalculate_categories(&store, race(), true).await.unwrap();

        assert_eq!(report.updated, 0);
        assert_eq!(report.pending.len(), 2);
        assert_eq!(*store.writes.lock().unwrap(), 0);
    }
}
