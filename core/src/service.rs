use std::io::Read;

use anyhow::{Result, bail};
use chrono::{NaiveDate, Weekday};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::catalog_import::{self, CatalogImportSummary};
use crate::classifier::{self, TrainedModel, TrainingConfig};
use crate::db::Database;
use crate::features::{self, FeatureRow};
use crate::models::{CourseType, MealHistoryEntry};
use crate::ranking::{self, Prediction};
use crate::selection::{self, Prompter, SelectionContext, SelectionOutcome};
use crate::week::{self, MealTime, WeekSetupOutcome, WeekSlot};

/// One row of the ranked probability table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecipe {
    pub recipe_id: i64,
    pub name: String,
    pub course: CourseType,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    pub trained: TrainedModel,
    pub recipes: Vec<RankedRecipe>,
}

pub struct PlannerService {
    db: Database,
    config: TrainingConfig,
}

impl PlannerService {
    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::from_database(db))
    }

    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self {
            db,
            config: TrainingConfig::default(),
        }
    }

    #[must_use]
    pub fn with_training_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        Catalog::load(&self.db)
    }

    // --- Recommendation pipeline ---

    /// Labelled rows for every history entry. Fails when an entry references
    /// a recipe that has since been deleted.
    pub fn training_set(&self) -> Result<Vec<FeatureRow>> {
        let catalog = self.load_catalog()?;
        let history = self.db.get_meal_history()?;
        Ok(features::build_training_rows(&catalog, &history)?)
    }

    pub fn train(&self) -> Result<TrainedModel> {
        let rows = self.training_set()?;
        Ok(classifier::train(&rows, &self.config))
    }

    fn predict(
        &self,
        catalog: &Catalog,
        history: &[MealHistoryEntry],
        today: NaiveDate,
    ) -> Result<(TrainedModel, Vec<Prediction>)> {
        let training = features::build_training_rows(catalog, history)?;
        let trained = classifier::train(&training, &self.config);
        let scoring = features::build_scoring_rows(catalog, history, today);
        let ranked = ranking::rank(ranking::score_candidates(&trained.model, &scoring));
        Ok((trained, ranked))
    }

    /// Train on the full history and rank every catalog recipe for `today`.
    /// No dietary filter is applied.
    pub fn rank(&self, today: NaiveDate) -> Result<Ranking> {
        let catalog = self.load_catalog()?;
        let history = self.db.get_meal_history()?;
        let (trained, ranked) = self.predict(&catalog, &history, today)?;

        let recipes = ranked
            .iter()
            .filter_map(|p| {
                catalog.get(p.recipe_id).map(|r| RankedRecipe {
                    recipe_id: r.id,
                    name: r.name.clone(),
                    course: r.course,
                    probability: p.probability,
                })
            })
            .collect();
        Ok(Ranking { trained, recipes })
    }

    /// Run the interactive selection for `today`, writing every decision back.
    pub fn plan_meal(
        &self,
        prompter: &mut dyn Prompter,
        today: NaiveDate,
    ) -> Result<SelectionOutcome> {
        let catalog = self.load_catalog()?;
        let history = self.db.get_meal_history()?;
        let (_, ranked) = self.predict(&catalog, &history, today)?;

        let ctx = SelectionContext {
            store: &self.db,
            catalog: &catalog,
            ranked: &ranked,
            today,
        };
        Ok(selection::run_selection(&ctx, prompter)?)
    }

    /// Plan a meal for one slot of the saved week and, once a main dish is
    /// chosen, record it as that slot's recipe.
    pub fn plan_slot(
        &self,
        prompter: &mut dyn Prompter,
        today: NaiveDate,
        day: Weekday,
        meal: MealTime,
    ) -> Result<SelectionOutcome> {
        if !self.db.get_week()?.iter().any(|s| s.day == day && s.meal == meal) {
            bail!(
                "{} {meal} is not in the weekly plan; run `supper week plan` first",
                week::day_name(day)
            );
        }
        let outcome = self.plan_meal(prompter, today)?;
        if let SelectionOutcome::Selected(selection) = &outcome {
            self.db.assign_week_recipe(day, meal, Some(selection.main.id))?;
        }
        Ok(outcome)
    }

    // --- Weekly plan ---

    /// Ask who eats where for every slot of the week. The plan replaces the
    /// saved one only when every slot was confirmed.
    pub fn plan_week(&self, prompter: &mut dyn Prompter) -> Result<WeekSetupOutcome> {
        let outcome = week::run_week_setup(&self.db, prompter)?;
        if let WeekSetupOutcome::Planned { slots } = &outcome {
            self.db.save_week(slots)?;
        }
        Ok(outcome)
    }

    pub fn week(&self) -> Result<Vec<WeekSlot>> {
        self.db.get_week()
    }

    // --- Catalog import ---

    pub fn import_ingredients_csv<R: Read>(
        &self,
        reader: R,
        dry_run: bool,
    ) -> Result<CatalogImportSummary> {
        let rows = catalog_import::parse_ingredients_csv(reader)?;
        catalog_import::import_ingredients(&self.db, &rows, dry_run)
    }

    pub fn import_recipes_csv<R: Read>(
        &self,
        reader: R,
        dry_run: bool,
    ) -> Result<CatalogImportSummary> {
        let rows = catalog_import::parse_recipes_csv(reader)?;
        catalog_import::import_recipes(&self.db, &rows, dry_run)
    }
}
