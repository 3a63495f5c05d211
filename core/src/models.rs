use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};

/// Maximum number of decisions kept in the meal history log.
pub const HISTORY_CAPACITY: i64 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseType {
    Single,
    Main,
    Side,
}

impl CourseType {
    /// Label stored in the database and shown to the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CourseType::Single => "single dish",
            CourseType::Main => "main dish",
            CourseType::Side => "side dish",
        }
    }

    /// Single dishes and main dishes both compete for the main slot of a meal.
    #[must_use]
    pub fn is_main_candidate(self) -> bool {
        matches!(self, CourseType::Single | CourseType::Main)
    }

    pub fn parse(s: &str) -> PlanResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" | "single dish" => Ok(CourseType::Single),
            "main" | "main dish" => Ok(CourseType::Main),
            "side" | "side dish" => Ok(CourseType::Side),
            _ => Err(PlanError::Validation(format!(
                "Invalid course type '{s}'. Must be one of: single, main, side"
            ))),
        }
    }
}

impl fmt::Display for CourseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const INGREDIENT_CATEGORIES: &[&str] = &[
    "beef",
    "pork",
    "chicken",
    "fish",
    "vegetables",
    "animal origin",
    "legumes",
    "cereal",
    "fruit",
    "other",
];

pub fn validate_category(category: &str) -> PlanResult<String> {
    let lower = category.trim().to_lowercase();
    if INGREDIENT_CATEGORIES.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        Err(PlanError::Validation(format!(
            "Invalid ingredient category '{category}'. Must be one of: {}",
            INGREDIENT_CATEGORIES.join(", ")
        )))
    }
}

/// Months (1-12, inclusive) in which an ingredient is available.
///
/// A window whose start is after its end wraps across the new year, so
/// `11..=2` covers November, December, January and February.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub start_month: u32,
    pub end_month: u32,
}

impl SeasonWindow {
    pub const ALL_YEAR: SeasonWindow = SeasonWindow {
        start_month: 1,
        end_month: 12,
    };

    pub fn new(start_month: u32, end_month: u32) -> PlanResult<Self> {
        for month in [start_month, end_month] {
            if !(1..=12).contains(&month) {
                return Err(PlanError::Validation(format!(
                    "Season month must be between 1 and 12 (got {month})"
                )));
            }
        }
        Ok(Self {
            start_month,
            end_month,
        })
    }

    #[must_use]
    pub fn contains(&self, month: u32) -> bool {
        if self.start_month <= self.end_month {
            (self.start_month..=self.end_month).contains(&month)
        } else {
            month >= self.start_month || month <= self.end_month
        }
    }
}

impl Default for SeasonWindow {
    fn default() -> Self {
        Self::ALL_YEAR
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub category: String,
    pub season: SeasonWindow,
    pub contains_gluten: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub course: CourseType,
    pub prep_minutes: i64,
    pub portions: i64,
    pub preservation_days: i64,
    pub freezable: bool,
    pub score: i64,
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub course: CourseType,
    pub prep_minutes: i64,
    pub portions: i64,
    pub preservation_days: i64,
    pub freezable: bool,
    pub ingredients: Vec<NewRecipeIngredient>,
}

impl NewRecipe {
    /// Field checks shared by inserts and import dry runs. Ingredient
    /// existence is checked by the store.
    pub fn validate(&self) -> PlanResult<()> {
        if self.name.trim().is_empty() {
            return Err(PlanError::Validation(
                "Recipe name must not be empty".to_string(),
            ));
        }
        if self.portions <= 0 {
            return Err(PlanError::Validation(
                "Portions must be greater than 0".to_string(),
            ));
        }
        if self.prep_minutes < 0 || self.preservation_days < 0 {
            return Err(PlanError::Validation(
                "Preparation time and preservation days must not be negative".to_string(),
            ));
        }
        if let Some(link) = self
            .ingredients
            .iter()
            .find(|l| l.ingredient_name.trim().is_empty() || l.quantity <= 0.0)
        {
            return Err(PlanError::Validation(format!(
                "Invalid ingredient '{}' ({}) in recipe '{}'",
                link.ingredient_name, link.quantity, self.name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewRecipeIngredient {
    pub ingredient_name: String,
    pub quantity: f64,
}

/// A recipe's ingredient link joined with the ingredient's dietary fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeIngredient {
    pub recipe_id: i64,
    pub ingredient_name: String,
    pub quantity: f64,
    pub contains_gluten: bool,
    pub season: SeasonWindow,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub celiac: bool,
    #[serde(default)]
    pub intolerances: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealHistoryEntry {
    pub id: i64,
    pub recipe_id: i64,
    pub date: NaiveDate,
    pub in_season: bool,
    pub score_at_time: i64,
    pub accepted: bool,
}

/// Raw history append, as consumed by `Database::add_meal_history_entry`.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub recipe_id: i64,
    pub date: NaiveDate,
    pub in_season: bool,
    pub score_at_time: i64,
    pub accepted: bool,
}

/// An accept/reject decision to be written back.
///
/// The store snapshots the recipe's score itself, so callers never pass a
/// stale `score_at_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub recipe_id: i64,
    pub date: NaiveDate,
    pub in_season: bool,
    pub accepted: bool,
}

impl Decision {
    #[must_use]
    pub fn score_delta(&self) -> i64 {
        if self.accepted { 1 } else { -1 }
    }
}

/// Where a batch of cooked portions is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compartment {
    Fridge,
    Freezer,
}

impl Compartment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Compartment::Fridge => "fridge",
            Compartment::Freezer => "freezer",
        }
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw ingredient stock in the pantry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredIngredient {
    pub ingredient_name: String,
    pub category: String,
    pub quantity: f64,
}

/// Cooked portions of a recipe kept in the fridge or freezer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMeal {
    pub compartment: Compartment,
    pub recipe_id: i64,
    pub recipe_name: String,
    pub portions: i64,
    pub stored_on: NaiveDate,
    /// Last day the portions keep. Frozen portions have none.
    pub use_by: Option<NaiveDate>,
}

impl StoredMeal {
    #[must_use]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.use_by.is_some_and(|d| today > d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_window_plain() {
        let spring = SeasonWindow::new(3, 5).unwrap();
        assert!(!spring.contains(2));
        assert!(spring.contains(3));
        assert!(spring.contains(4));
        assert!(spring.contains(5));
        assert!(!spring.contains(6));
    }

    #[test]
    fn test_season_window_wraps_year() {
        let winter = SeasonWindow::new(11, 2).unwrap();
        assert!(winter.contains(11));
        assert!(winter.contains(12));
        assert!(winter.contains(1));
        assert!(winter.contains(2));
        assert!(!winter.contains(3));
        assert!(!winter.contains(10));
    }

    #[test]
    fn test_season_window_single_month() {
        let june = SeasonWindow::new(6, 6).unwrap();
        assert!(june.contains(6));
        assert!(!june.contains(7));
    }

    #[test]
    fn test_season_window_rejects_bad_month() {
        assert!(SeasonWindow::new(0, 5).is_err());
        assert!(SeasonWindow::new(1, 13).is_err());
    }

    #[test]
    fn test_all_year_contains_every_month() {
        for m in 1..=12 {
            assert!(SeasonWindow::ALL_YEAR.contains(m));
        }
    }

    #[test]
    fn test_course_type_parse() {
        assert_eq!(CourseType::parse("Main").unwrap(), CourseType::Main);
        assert_eq!(CourseType::parse("side dish").unwrap(), CourseType::Side);
        assert_eq!(CourseType::parse(" single ").unwrap(), CourseType::Single);
        assert!(CourseType::parse("dessert").is_err());
    }

    #[test]
    fn test_course_type_round_trips_through_label() {
        for course in [CourseType::Single, CourseType::Main, CourseType::Side] {
            assert_eq!(CourseType::parse(course.as_str()).unwrap(), course);
        }
    }

    #[test]
    fn test_main_candidates() {
        assert!(CourseType::Single.is_main_candidate());
        assert!(CourseType::Main.is_main_candidate());
        assert!(!CourseType::Side.is_main_candidate());
    }

    #[test]
    fn test_validate_category() {
        assert_eq!(validate_category("Vegetables").unwrap(), "vegetables");
        assert_eq!(validate_category("animal origin").unwrap(), "animal origin");
        let err = validate_category("candy").unwrap_err();
        assert!(err.to_string().contains("candy"));
    }

    fn new_recipe(portions: i64, prep_minutes: i64) -> NewRecipe {
        NewRecipe {
            name: "Stew".to_string(),
            course: CourseType::Main,
            prep_minutes,
            portions,
            preservation_days: 3,
            freezable: true,
            ingredients: vec![NewRecipeIngredient {
                ingredient_name: "Beef".to_string(),
                quantity: 500.0,
            }],
        }
    }

    #[test]
    fn test_new_recipe_validate() {
        assert!(new_recipe(4, 90).validate().is_ok());
        assert!(new_recipe(0, 90).validate().is_err());
        assert!(new_recipe(4, -1).validate().is_err());

        let mut blank = new_recipe(4, 90);
        blank.name = "  ".to_string();
        assert!(blank.validate().is_err());

        let mut bad_link = new_recipe(4, 90);
        bad_link.ingredients[0].quantity = 0.0;
        assert!(bad_link.validate().is_err());
    }

    #[test]
    fn test_decision_score_delta() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let accept = Decision {
            recipe_id: 1,
            date,
            in_season: true,
            accepted: true,
        };
        let reject = Decision {
            accepted: false,
            ..accept
        };
        assert_eq!(accept.score_delta(), 1);
        assert_eq!(reject.score_delta(), -1);
    }

    #[test]
    fn test_stored_meal_expiry() {
        let stored_on = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let fridge = StoredMeal {
            compartment: Compartment::Fridge,
            recipe_id: 1,
            recipe_name: "Stew".to_string(),
            portions: 2,
            stored_on,
            use_by: Some(NaiveDate::from_ymd_opt(2024, 6, 13).unwrap()),
        };
        assert!(!fridge.is_expired(NaiveDate::from_ymd_opt(2024, 6, 13).unwrap()));
        assert!(fridge.is_expired(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()));

        let frozen = StoredMeal {
            compartment: Compartment::Freezer,
            use_by: None,
            ..fridge
        };
        assert!(!frozen.is_expired(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()));
    }
}
