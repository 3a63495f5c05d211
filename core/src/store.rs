use anyhow::Result;

use crate::db::Database;
use crate::models::{Decision, MealHistoryEntry, Profile, Recipe, RecipeIngredient};

/// The persistence surface the engine reads from and writes decisions to.
///
/// `Database` is the production implementation; the selection loop only
/// ever sees this trait.
pub trait MealStore {
    fn all_recipes(&self) -> Result<Vec<Recipe>>;
    fn recipe_ingredients(&self, recipe_id: i64) -> Result<Vec<RecipeIngredient>>;
    fn meal_history(&self) -> Result<Vec<MealHistoryEntry>>;
    fn all_profiles(&self) -> Result<Vec<Profile>>;
    fn profile_by_name(&self, name: &str) -> Result<Option<Profile>>;

    /// Atomically append the history entry and apply the score change.
    fn record_decision(&self, decision: &Decision) -> Result<MealHistoryEntry>;
}

impl MealStore for Database {
    fn all_recipes(&self) -> Result<Vec<Recipe>> {
        self.get_all_recipes()
    }

    fn recipe_ingredients(&self, recipe_id: i64) -> Result<Vec<RecipeIngredient>> {
        self.get_recipe_ingredients(recipe_id)
    }

    fn meal_history(&self) -> Result<Vec<MealHistoryEntry>> {
        self.get_meal_history()
    }

    fn all_profiles(&self) -> Result<Vec<Profile>> {
        self.get_all_profiles()
    }

    fn profile_by_name(&self, name: &str) -> Result<Option<Profile>> {
        self.get_profile_by_name(name)
    }

    fn record_decision(&self, decision: &Decision) -> Result<MealHistoryEntry> {
        Database::record_decision(self, decision)
    }
}
