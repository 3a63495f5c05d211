use std::collections::HashMap;

use anyhow::Result;

use crate::models::{Recipe, RecipeIngredient};
use crate::store::MealStore;

/// In-memory snapshot of the recipe catalog, loaded once per planning run.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    recipes: Vec<Recipe>,
    ingredients: HashMap<i64, Vec<RecipeIngredient>>,
}

impl Catalog {
    pub fn load(store: &dyn MealStore) -> Result<Self> {
        let recipes = store.all_recipes()?;
        let mut ingredients = HashMap::with_capacity(recipes.len());
        for recipe in &recipes {
            ingredients.insert(recipe.id, store.recipe_ingredients(recipe.id)?);
        }
        tracing::debug!(recipes = recipes.len(), "loaded catalog");
        Ok(Self::from_parts(recipes, ingredients))
    }

    #[must_use]
    pub fn from_parts(
        mut recipes: Vec<Recipe>,
        ingredients: HashMap<i64, Vec<RecipeIngredient>>,
    ) -> Self {
        recipes.sort_by_key(|r| r.id);
        Self {
            recipes,
            ingredients,
        }
    }

    /// Recipes in ascending id order.
    #[must_use]
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Recipe> {
        self.recipes
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|idx| &self.recipes[idx])
    }

    #[must_use]
    pub fn ingredients(&self, recipe_id: i64) -> &[RecipeIngredient] {
        self.ingredients
            .get(&recipe_id)
            .map_or(&[], Vec::as_slice)
    }

    /// A recipe is in season when every ingredient's window contains `month`.
    /// Recipes without ingredients are always in season.
    #[must_use]
    pub fn in_season(&self, recipe_id: i64, month: u32) -> bool {
        self.ingredients(recipe_id)
            .iter()
            .all(|i| i.season.contains(month))
    }

    #[must_use]
    pub fn contains_gluten(&self, recipe_id: i64) -> bool {
        self.ingredients(recipe_id).iter().any(|i| i.contains_gluten)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{CourseType, Ingredient, NewRecipe, NewRecipeIngredient, SeasonWindow};

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.insert_ingredient(&Ingredient {
            name: "Asparagus".to_string(),
            category: "vegetables".to_string(),
            season: SeasonWindow::new(4, 6).unwrap(),
            contains_gluten: false,
        })
        .unwrap();
        db.insert_ingredient(&Ingredient {
            name: "Pasta".to_string(),
            category: "cereal".to_string(),
            season: SeasonWindow::ALL_YEAR,
            contains_gluten: true,
        })
        .unwrap();
        db.insert_recipe(&NewRecipe {
            name: "Asparagus Pasta".to_string(),
            course: CourseType::Single,
            prep_minutes: 25,
            portions: 2,
            preservation_days: 1,
            freezable: false,
            ingredients: vec![
                NewRecipeIngredient {
                    ingredient_name: "Asparagus".to_string(),
                    quantity: 200.0,
                },
                NewRecipeIngredient {
                    ingredient_name: "Pasta".to_string(),
                    quantity: 160.0,
                },
            ],
        })
        .unwrap();
        db.insert_recipe(&NewRecipe {
            name: "Water".to_string(),
            course: CourseType::Side,
            prep_minutes: 0,
            portions: 1,
            preservation_days: 0,
            freezable: false,
            ingredients: vec![],
        })
        .unwrap();
        db
    }

    #[test]
    fn test_load_catalog() {
        let db = seeded_db();
        let catalog = Catalog::load(&db).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.recipes()[0].name, "Asparagus Pasta");
        assert_eq!(catalog.ingredients(1).len(), 2);
        assert!(catalog.get(3).is_none());
        assert!(catalog.ingredients(3).is_empty());
    }

    #[test]
    fn test_in_season_requires_every_ingredient() {
        let db = seeded_db();
        let catalog = Catalog::load(&db).unwrap();
        assert!(catalog.in_season(1, 5));
        assert!(!catalog.in_season(1, 8));
        // No ingredients: always in season
        assert!(catalog.in_season(2, 8));
    }

    #[test]
    fn test_contains_gluten() {
        let db = seeded_db();
        let catalog = Catalog::load(&db).unwrap();
        assert!(catalog.contains_gluten(1));
        assert!(!catalog.contains_gluten(2));
    }
}
