//! Turns the catalog and the decision log into fixed-schema feature rows.
//!
//! Training mode yields one row per history entry (labelled with the
//! decision). Scoring mode yields one unlabelled row per catalog recipe,
//! evaluated as of a given day.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::{PlanError, PlanResult};
use crate::models::{MealHistoryEntry, Recipe};

pub const FEATURE_COUNT: usize = 7;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "time_to_prepare",
    "portions",
    "preservation_days",
    "can_be_frozen",
    "time_since_last_accepted",
    "in_season",
    "current_score",
];

/// Imputed value when no row in a set has a defined `time_since_last_accepted`.
pub const MISSING_DAYS_FALLBACK: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub time_to_prepare: f64,
    pub portions: f64,
    pub preservation_days: f64,
    pub can_be_frozen: bool,
    /// Days since the recipe was last accepted. `None` until imputed when it
    /// has never been accepted.
    pub time_since_last_accepted: Option<f64>,
    pub in_season: bool,
    pub current_score: f64,
    pub accepted: Option<bool>,
}

impl FeatureRow {
    #[allow(clippy::cast_precision_loss)]
    fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            time_to_prepare: recipe.prep_minutes as f64,
            portions: recipe.portions as f64,
            preservation_days: recipe.preservation_days as f64,
            can_be_frozen: recipe.freezable,
            time_since_last_accepted: None,
            in_season: false,
            current_score: recipe.score as f64,
            accepted: None,
        }
    }

    /// Numeric vector in `FEATURE_NAMES` order.
    #[must_use]
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.time_to_prepare,
            self.portions,
            self.preservation_days,
            f64::from(u8::from(self.can_be_frozen)),
            self.time_since_last_accepted
                .unwrap_or(MISSING_DAYS_FALLBACK),
            f64::from(u8::from(self.in_season)),
            self.current_score,
        ]
    }
}

/// A live row for one catalog recipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringRow {
    pub recipe_id: i64,
    pub row: FeatureRow,
}

/// Days between `as_of` and the most recent accepted entry for `recipe_id`
/// dated on or before `as_of`. `exclude_id` skips the entry being labelled,
/// so a training row never sees its own outcome.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn days_since_last_accepted(
    history: &[MealHistoryEntry],
    recipe_id: i64,
    as_of: NaiveDate,
    exclude_id: Option<i64>,
) -> Option<f64> {
    history
        .iter()
        .filter(|e| {
            e.recipe_id == recipe_id
                && e.accepted
                && e.date <= as_of
                && Some(e.id) != exclude_id
        })
        .map(|e| e.date)
        .max()
        .map(|last| (as_of - last).num_days() as f64)
}

/// Replace undefined `time_since_last_accepted` values with the mean of the
/// defined ones in the same set. Returns the value used.
#[allow(clippy::cast_precision_loss)]
pub fn impute_missing(rows: &mut [FeatureRow]) -> f64 {
    let defined: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.time_since_last_accepted)
        .collect();
    let fill = if defined.is_empty() {
        MISSING_DAYS_FALLBACK
    } else {
        defined.iter().sum::<f64>() / defined.len() as f64
    };
    for row in rows.iter_mut() {
        row.time_since_last_accepted.get_or_insert(fill);
    }
    fill
}

/// One labelled row per history entry, in ascending entry id order.
///
/// `in_season` and `current_score` come from the entry itself, as they were
/// when the decision was made. An entry whose recipe is no longer in the
/// catalog aborts the build.
#[allow(clippy::cast_precision_loss)]
pub fn build_training_rows(
    catalog: &Catalog,
    history: &[MealHistoryEntry],
) -> PlanResult<Vec<FeatureRow>> {
    let mut ordered: Vec<&MealHistoryEntry> = history.iter().collect();
    ordered.sort_by_key(|e| e.id);

    let mut rows = Vec::with_capacity(ordered.len());
    for entry in ordered {
        let recipe = catalog
            .get(entry.recipe_id)
            .ok_or(PlanError::UnknownRecipe {
                history_id: entry.id,
                recipe_id: entry.recipe_id,
            })?;
        let mut row = FeatureRow::from_recipe(recipe);
        row.time_since_last_accepted =
            days_since_last_accepted(history, entry.recipe_id, entry.date, Some(entry.id));
        row.in_season = entry.in_season;
        row.current_score = entry.score_at_time as f64;
        row.accepted = Some(entry.accepted);
        rows.push(row);
    }

    let fill = impute_missing(&mut rows);
    tracing::debug!(rows = rows.len(), imputed_days = fill, "built training rows");
    Ok(rows)
}

/// One unlabelled row per catalog recipe, in ascending recipe id order,
/// evaluated for `today`.
#[must_use]
pub fn build_scoring_rows(
    catalog: &Catalog,
    history: &[MealHistoryEntry],
    today: NaiveDate,
) -> Vec<ScoringRow> {
    let month = today.month();
    let mut rows: Vec<FeatureRow> = catalog
        .recipes()
        .iter()
        .map(|recipe| {
            let mut row = FeatureRow::from_recipe(recipe);
            row.time_since_last_accepted = days_since_last_accepted(history, recipe.id, today, None);
            row.in_season = catalog.in_season(recipe.id, month);
            row
        })
        .collect();
    impute_missing(&mut rows);

    catalog
        .recipes()
        .iter()
        .zip(rows)
        .map(|(recipe, row)| ScoringRow {
            recipe_id: recipe.id,
            row,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::models::{CourseType, RecipeIngredient, SeasonWindow};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn recipe(id: i64, score: i64) -> Recipe {
        Recipe {
            id,
            name: format!("Recipe {id}"),
            course: CourseType::Main,
            prep_minutes: 10 * id,
            portions: 4,
            preservation_days: 3,
            freezable: id % 2 == 0,
            score,
        }
    }

    fn entry(id: i64, recipe_id: i64, day: u32, accepted: bool) -> MealHistoryEntry {
        MealHistoryEntry {
            id,
            recipe_id,
            date: date(2024, 3, day),
            in_season: true,
            score_at_time: id,
            accepted,
        }
    }

    fn catalog() -> Catalog {
        let mut ingredients = HashMap::new();
        ingredients.insert(
            2,
            vec![RecipeIngredient {
                recipe_id: 2,
                ingredient_name: "Cherries".to_string(),
                quantity: 300.0,
                contains_gluten: false,
                season: SeasonWindow::new(5, 7).unwrap(),
            }],
        );
        Catalog::from_parts(vec![recipe(2, -1), recipe(1, 3)], ingredients)
    }

    #[test]
    fn test_days_since_last_accepted() {
        let history = vec![
            entry(1, 1, 1, true),
            entry(2, 1, 5, false),
            entry(3, 1, 8, true),
            entry(4, 2, 9, true),
        ];
        let as_of = date(2024, 3, 10);
        assert_eq!(days_since_last_accepted(&history, 1, as_of, None), Some(2.0));
        // Later acceptances are ignored
        assert_eq!(
            days_since_last_accepted(&history, 1, date(2024, 3, 6), None),
            Some(5.0)
        );
        // Same-day acceptance is zero days, not missing
        assert_eq!(
            days_since_last_accepted(&history, 1, date(2024, 3, 8), None),
            Some(0.0)
        );
        assert_eq!(days_since_last_accepted(&history, 3, as_of, None), None);
    }

    #[test]
    fn test_days_since_excludes_own_entry() {
        let history = vec![entry(1, 1, 4, true)];
        assert_eq!(
            days_since_last_accepted(&history, 1, date(2024, 3, 4), Some(1)),
            None
        );
    }

    #[test]
    fn test_impute_missing_uses_mean_of_defined() {
        let base = FeatureRow::from_recipe(&recipe(1, 0));
        let mut rows = vec![
            FeatureRow {
                time_since_last_accepted: Some(2.0),
                ..base.clone()
            },
            FeatureRow {
                time_since_last_accepted: None,
                ..base.clone()
            },
            FeatureRow {
                time_since_last_accepted: Some(6.0),
                ..base.clone()
            },
        ];
        let fill = impute_missing(&mut rows);
        assert!((fill - 4.0).abs() < f64::EPSILON);
        assert_eq!(rows[1].time_since_last_accepted, Some(4.0));
        assert_eq!(rows[0].time_since_last_accepted, Some(2.0));
    }

    #[test]
    fn test_impute_missing_fallback_when_nothing_defined() {
        let mut rows = vec![FeatureRow::from_recipe(&recipe(1, 0)); 3];
        let fill = impute_missing(&mut rows);
        assert!((fill - MISSING_DAYS_FALLBACK).abs() < f64::EPSILON);
        assert!(
            rows.iter()
                .all(|r| r.time_since_last_accepted == Some(MISSING_DAYS_FALLBACK))
        );
    }

    #[test]
    fn test_build_training_rows() {
        let catalog = catalog();
        // Deliberately unordered
        let history = vec![
            entry(3, 1, 9, false),
            entry(1, 1, 2, true),
            entry(2, 2, 4, true),
        ];
        let rows = build_training_rows(&catalog, &history).unwrap();
        assert_eq!(rows.len(), 3);

        // Ordered by entry id
        assert_eq!(rows[0].accepted, Some(true));
        assert!((rows[0].current_score - 1.0).abs() < f64::EPSILON);
        assert!((rows[1].time_to_prepare - 20.0).abs() < f64::EPSILON);
        assert!(rows[1].can_be_frozen);

        // Entry 3: recipe 1 last accepted on day 2, seven days earlier
        assert_eq!(rows[2].time_since_last_accepted, Some(7.0));
        assert_eq!(rows[2].accepted, Some(false));
        // Entries 1 and 2 have no earlier acceptance and get the mean
        assert_eq!(rows[0].time_since_last_accepted, Some(7.0));
        assert_eq!(rows[1].time_since_last_accepted, Some(7.0));
    }

    #[test]
    fn test_build_training_rows_unknown_recipe() {
        let catalog = catalog();
        let history = vec![entry(1, 1, 2, true), entry(7, 99, 3, false)];
        let err = build_training_rows(&catalog, &history).unwrap_err();
        assert!(matches!(
            err,
            PlanError::UnknownRecipe {
                history_id: 7,
                recipe_id: 99
            }
        ));
    }

    #[test]
    fn test_build_training_rows_empty() {
        let rows = build_training_rows(&catalog(), &[]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_build_scoring_rows() {
        let catalog = catalog();
        let history = vec![entry(1, 1, 2, true)];
        let rows = build_scoring_rows(&catalog, &history, date(2024, 6, 1));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].recipe_id, 1);
        assert_eq!(rows[1].recipe_id, 2);

        // Current score comes from the recipe, not the history
        assert!((rows[0].row.current_score - 3.0).abs() < f64::EPSILON);
        assert!((rows[1].row.current_score + 1.0).abs() < f64::EPSILON);

        // March 2 to June 1
        assert_eq!(rows[0].row.time_since_last_accepted, Some(91.0));
        assert_eq!(rows[1].row.time_since_last_accepted, Some(91.0));

        assert!(rows[0].row.in_season);
        assert!(rows[1].row.in_season);
        let winter = build_scoring_rows(&catalog, &history, date(2024, 12, 1));
        assert!(!winter[1].row.in_season);
        assert_eq!(rows[0].row.accepted, None);
    }

    #[test]
    fn test_feature_vector_order() {
        let mut row = FeatureRow::from_recipe(&recipe(2, 5));
        row.time_since_last_accepted = Some(12.0);
        row.in_season = true;
        assert_eq!(row.features(), [20.0, 4.0, 3.0, 1.0, 12.0, 1.0, 5.0]);
    }
}
