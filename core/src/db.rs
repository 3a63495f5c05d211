use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Weekday};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{
    Compartment, CourseType, Decision, HISTORY_CAPACITY, Ingredient, MealHistoryEntry,
    NewHistoryEntry, NewRecipe, Profile, Recipe, RecipeDetail, RecipeIngredient, SeasonWindow,
    StoredIngredient, StoredMeal, validate_category,
};
use crate::week::{Location, MealTime, WEEK, WeekSlot};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS ingredients (
                    name TEXT PRIMARY KEY COLLATE NOCASE,
                    category TEXT NOT NULL,
                    season_start INTEGER NOT NULL DEFAULT 1 CHECK (season_start BETWEEN 1 AND 12),
                    season_end INTEGER NOT NULL DEFAULT 12 CHECK (season_end BETWEEN 1 AND 12),
                    contains_gluten INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS recipes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    course TEXT NOT NULL CHECK (course IN ('single dish', 'main dish', 'side dish')),
                    prep_minutes INTEGER NOT NULL,
                    portions INTEGER NOT NULL,
                    preservation_days INTEGER NOT NULL,
                    freezable INTEGER NOT NULL DEFAULT 0,
                    score INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS recipe_ingredients (
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id),
                    ingredient_name TEXT NOT NULL REFERENCES ingredients(name),
                    quantity REAL NOT NULL,
                    PRIMARY KEY (recipe_id, ingredient_name)
                );

                CREATE TABLE IF NOT EXISTS profiles (
                    name TEXT PRIMARY KEY COLLATE NOCASE,
                    celiac INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS profile_intolerances (
                    profile_name TEXT NOT NULL REFERENCES profiles(name),
                    ingredient_name TEXT NOT NULL,
                    PRIMARY KEY (profile_name, ingredient_name)
                );

                CREATE TABLE IF NOT EXISTS meal_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    recipe_id INTEGER NOT NULL,
                    date TEXT NOT NULL,
                    in_season INTEGER NOT NULL,
                    score_at_time INTEGER NOT NULL,
                    accepted INTEGER NOT NULL CHECK (accepted IN (0, 1))
                );

                CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
                CREATE INDEX IF NOT EXISTS idx_meal_history_recipe ON meal_history(recipe_id);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS storage (
                    ingredient_name TEXT PRIMARY KEY COLLATE NOCASE REFERENCES ingredients(name),
                    quantity REAL NOT NULL CHECK (quantity > 0)
                );

                CREATE TABLE IF NOT EXISTS fridge (
                    recipe_id INTEGER PRIMARY KEY REFERENCES recipes(id),
                    portions INTEGER NOT NULL CHECK (portions > 0),
                    stored_on TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS freezer (
                    recipe_id INTEGER PRIMARY KEY REFERENCES recipes(id),
                    portions INTEGER NOT NULL CHECK (portions > 0),
                    stored_on TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS week_slots (
                    day INTEGER NOT NULL CHECK (day BETWEEN 0 AND 6),
                    meal TEXT NOT NULL CHECK (meal IN ('lunch', 'dinner')),
                    location TEXT NOT NULL CHECK (location IN ('home', 'work')),
                    recipe_id INTEGER REFERENCES recipes(id),
                    PRIMARY KEY (day, meal)
                );

                CREATE TABLE IF NOT EXISTS week_slot_participants (
                    day INTEGER NOT NULL,
                    meal TEXT NOT NULL,
                    profile_name TEXT NOT NULL COLLATE NOCASE,
                    PRIMARY KEY (day, meal, profile_name)
                );

                PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn conversion_error(
        idx: usize,
        err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, err.into())
    }

    // Expects columns:
    // 0: id, 1: name, 2: course, 3: prep_minutes, 4: portions,
    // 5: preservation_days, 6: freezable, 7: score
    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        let course: String = row.get(2)?;
        let course = CourseType::parse(&course).map_err(|e| Self::conversion_error(2, e))?;
        Ok(Recipe {
            id: row.get(0)?,
            name: row.get(1)?,
            course,
            prep_minutes: row.get(3)?,
            portions: row.get(4)?,
            preservation_days: row.get(5)?,
            freezable: row.get(6)?,
            score: row.get(7)?,
        })
    }

    fn ingredient_from_row(row: &rusqlite::Row) -> rusqlite::Result<Ingredient> {
        Ok(Ingredient {
            name: row.get(0)?,
            category: row.get(1)?,
            season: SeasonWindow {
                start_month: row.get(2)?,
                end_month: row.get(3)?,
            },
            contains_gluten: row.get(4)?,
        })
    }

    fn history_from_row(row: &rusqlite::Row) -> rusqlite::Result<MealHistoryEntry> {
        let date: String = row.get(2)?;
        let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|e| Self::conversion_error(2, e))?;
        Ok(MealHistoryEntry {
            id: row.get(0)?,
            recipe_id: row.get(1)?,
            date,
            in_season: row.get(3)?,
            score_at_time: row.get(4)?,
            accepted: row.get(5)?,
        })
    }

    // --- Ingredients ---

    pub fn insert_ingredient(&self, ingredient: &Ingredient) -> Result<Ingredient> {
        let category = validate_category(&ingredient.category)?;
        let season = SeasonWindow::new(ingredient.season.start_month, ingredient.season.end_month)?;
        let name = ingredient.name.trim();
        if name.is_empty() {
            bail!("Ingredient name must not be empty");
        }
        self.conn
            .execute(
                "INSERT INTO ingredients (name, category, season_start, season_end, contains_gluten)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    name,
                    category,
                    season.start_month,
                    season.end_month,
                    ingredient.contains_gluten,
                ],
            )
            .with_context(|| format!("Failed to add ingredient '{name}'"))?;
        self.get_ingredient(name)?
            .with_context(|| format!("Ingredient '{name}' not found"))
    }

    pub fn get_ingredient(&self, name: &str) -> Result<Option<Ingredient>> {
        let ingredient = self
            .conn
            .query_row(
                "SELECT name, category, season_start, season_end, contains_gluten
                 FROM ingredients WHERE name = ?1",
                params![name],
                Self::ingredient_from_row,
            )
            .optional()?;
        Ok(ingredient)
    }

    pub fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, category, season_start, season_end, contains_gluten
             FROM ingredients ORDER BY name",
        )?;
        let ingredients = stmt
            .query_map([], Self::ingredient_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    /// Delete an ingredient. Refused while any recipe still uses it.
    pub fn delete_ingredient(&self, name: &str) -> Result<bool> {
        let used_by: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM recipe_ingredients WHERE ingredient_name = ?1 COLLATE NOCASE",
            params![name],
            |row| row.get(0),
        )?;
        if used_by > 0 {
            bail!("Ingredient '{name}' is used by {used_by} recipe(s); remove those first");
        }
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM storage WHERE ingredient_name = ?1", params![name])?;
        let rows = tx.execute("DELETE FROM ingredients WHERE name = ?1", params![name])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // --- Recipes ---

    pub fn insert_recipe(&self, recipe: &NewRecipe) -> Result<Recipe> {
        recipe.validate()?;
        let name = recipe.name.trim();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO recipes (name, course, prep_minutes, portions, preservation_days, freezable, score)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
            params![
                name,
                recipe.course.as_str(),
                recipe.prep_minutes,
                recipe.portions,
                recipe.preservation_days,
                recipe.freezable,
            ],
        )
        .with_context(|| format!("Failed to add recipe '{name}'"))?;
        let id = tx.last_insert_rowid();

        for link in &recipe.ingredients {
            let canonical: Option<String> = tx
                .query_row(
                    "SELECT name FROM ingredients WHERE name = ?1",
                    params![link.ingredient_name.trim()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(canonical) = canonical else {
                bail!(
                    "Unknown ingredient '{}' in recipe '{name}'",
                    link.ingredient_name
                );
            };
            tx.execute(
                "INSERT OR REPLACE INTO recipe_ingredients (recipe_id, ingredient_name, quantity)
                 VALUES (?1, ?2, ?3)",
                params![id, canonical, link.quantity],
            )?;
        }
        tx.commit()?;

        self.get_recipe_by_id(id)
    }

    pub fn get_recipe_by_id(&self, id: i64) -> Result<Recipe> {
        self.conn
            .query_row(
                "SELECT id, name, course, prep_minutes, portions, preservation_days, freezable, score
                 FROM recipes WHERE id = ?1",
                params![id],
                Self::recipe_from_row,
            )
            .with_context(|| format!("Recipe {id} not found"))
    }

    pub fn find_recipe_by_name(&self, name: &str) -> Result<Option<Recipe>> {
        let recipe = self
            .conn
            .query_row(
                "SELECT id, name, course, prep_minutes, portions, preservation_days, freezable, score
                 FROM recipes WHERE name = ?1",
                params![name.trim()],
                Self::recipe_from_row,
            )
            .optional()?;
        Ok(recipe)
    }

    pub fn get_recipe_by_name(&self, name: &str) -> Result<Recipe> {
        self.find_recipe_by_name(name)?
            .with_context(|| format!("Recipe '{name}' not found"))
    }

    pub fn get_all_recipes(&self) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, course, prep_minutes, portions, preservation_days, freezable, score
             FROM recipes ORDER BY id",
        )?;
        let recipes = stmt
            .query_map([], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    pub fn get_recipe_ingredients(&self, recipe_id: i64) -> Result<Vec<RecipeIngredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT ri.recipe_id, ri.ingredient_name, ri.quantity,
                    i.contains_gluten, i.season_start, i.season_end
             FROM recipe_ingredients ri
             JOIN ingredients i ON ri.ingredient_name = i.name
             WHERE ri.recipe_id = ?1
             ORDER BY ri.ingredient_name",
        )?;
        let ingredients = stmt
            .query_map(params![recipe_id], |row| {
                Ok(RecipeIngredient {
                    recipe_id: row.get(0)?,
                    ingredient_name: row.get(1)?,
                    quantity: row.get(2)?,
                    contains_gluten: row.get(3)?,
                    season: SeasonWindow {
                        start_month: row.get(4)?,
                        end_month: row.get(5)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    pub fn get_recipe_detail(&self, recipe_id: i64) -> Result<RecipeDetail> {
        let recipe = self.get_recipe_by_id(recipe_id)?;
        let ingredients = self.get_recipe_ingredients(recipe_id)?;
        Ok(RecipeDetail {
            recipe,
            ingredients,
        })
    }

    /// Apply a raw score change. Prefer `record_decision`, which pairs the
    /// change with its history entry.
    pub fn update_recipe_score(&self, recipe_id: i64, delta: i64) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE recipes SET score = score + ?1 WHERE id = ?2",
            params![delta, recipe_id],
        )?;
        if rows == 0 {
            bail!("Recipe {recipe_id} not found");
        }
        Ok(())
    }

    /// Number of history entries that reference `recipe_id`.
    pub fn history_references(&self, recipe_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM meal_history WHERE recipe_id = ?1",
            params![recipe_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a recipe with its ingredient links, stored portions and week
    /// assignments. Refused while the meal history still references it, since
    /// training needs every history entry to resolve.
    pub fn delete_recipe(&self, recipe_id: i64) -> Result<bool> {
        let referenced = self.history_references(recipe_id)?;
        if referenced > 0 {
            bail!(
                "Recipe {recipe_id} has {referenced} meal history entries; \
                 it can be deleted once they have aged out of the history"
            );
        }
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM recipe_ingredients WHERE recipe_id = ?1",
            params![recipe_id],
        )?;
        tx.execute("DELETE FROM fridge WHERE recipe_id = ?1", params![recipe_id])?;
        tx.execute("DELETE FROM freezer WHERE recipe_id = ?1", params![recipe_id])?;
        tx.execute(
            "UPDATE week_slots SET recipe_id = NULL WHERE recipe_id = ?1",
            params![recipe_id],
        )?;
        let rows = tx.execute("DELETE FROM recipes WHERE id = ?1", params![recipe_id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // --- Profiles ---

    pub fn insert_profile(&self, profile: &Profile) -> Result<Profile> {
        let name = profile.name.trim();
        if name.is_empty() {
            bail!("Profile name must not be empty");
        }
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO profiles (name, celiac) VALUES (?1, ?2)",
            params![name, profile.celiac],
        )
        .with_context(|| format!("Failed to add profile '{name}'"))?;
        for intolerance in &profile.intolerances {
            let intolerance = intolerance.trim();
            if intolerance.is_empty() {
                continue;
            }
            tx.execute(
                "INSERT OR IGNORE INTO profile_intolerances (profile_name, ingredient_name)
                 VALUES (?1, ?2)",
                params![name, intolerance],
            )?;
        }
        tx.commit()?;
        self.get_profile_by_name(name)?
            .with_context(|| format!("Profile '{name}' not found"))
    }

    fn profile_intolerances(&self, profile_name: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT ingredient_name FROM profile_intolerances
             WHERE profile_name = ?1 COLLATE NOCASE ORDER BY ingredient_name",
        )?;
        let names = stmt
            .query_map(params![profile_name], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn get_profile_by_name(&self, name: &str) -> Result<Option<Profile>> {
        let found = self
            .conn
            .query_row(
                "SELECT name, celiac FROM profiles WHERE name = ?1",
                params![name.trim()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)),
            )
            .optional()?;
        match found {
            Some((name, celiac)) => {
                let intolerances = self.profile_intolerances(&name)?;
                Ok(Some(Profile {
                    name,
                    celiac,
                    intolerances,
                }))
            }
            None => Ok(None),
        }
    }

    pub fn get_all_profiles(&self) -> Result<Vec<Profile>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, celiac FROM profiles ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        let mut profiles = Vec::with_capacity(rows.len());
        for (name, celiac) in rows {
            let intolerances = self.profile_intolerances(&name)?;
            profiles.push(Profile {
                name,
                celiac,
                intolerances,
            });
        }
        Ok(profiles)
    }

    pub fn delete_profile(&self, name: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM profile_intolerances WHERE profile_name = ?1 COLLATE NOCASE",
            params![name],
        )?;
        tx.execute(
            "DELETE FROM week_slot_participants WHERE profile_name = ?1",
            params![name],
        )?;
        let rows = tx.execute("DELETE FROM profiles WHERE name = ?1", params![name])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // --- Meal history ---

    pub fn get_meal_history(&self) -> Result<Vec<MealHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recipe_id, date, in_season, score_at_time, accepted
             FROM meal_history ORDER BY id",
        )?;
        let entries = stmt
            .query_map([], Self::history_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn history_len(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM meal_history", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Append a raw history entry, evicting the oldest entries past capacity.
    pub fn add_meal_history_entry(&self, entry: &NewHistoryEntry) -> Result<MealHistoryEntry> {
        let tx = self.conn.unchecked_transaction()?;
        let id = Self::append_history(&tx, entry)?;
        Self::evict_overflow(&tx)?;
        tx.commit()?;
        Ok(MealHistoryEntry {
            id,
            recipe_id: entry.recipe_id,
            date: entry.date,
            in_season: entry.in_season,
            score_at_time: entry.score_at_time,
            accepted: entry.accepted,
        })
    }

    /// Write back one decision: snapshot the recipe's score, append the
    /// history entry, apply the ±1 score change and trim the log, all in a
    /// single transaction.
    pub fn record_decision(&self, decision: &Decision) -> Result<MealHistoryEntry> {
        let tx = self.conn.unchecked_transaction()?;
        let score_at_time: i64 = tx
            .query_row(
                "SELECT score FROM recipes WHERE id = ?1",
                params![decision.recipe_id],
                |row| row.get(0),
            )
            .with_context(|| format!("Recipe {} not found", decision.recipe_id))?;

        let entry = NewHistoryEntry {
            recipe_id: decision.recipe_id,
            date: decision.date,
            in_season: decision.in_season,
            score_at_time,
            accepted: decision.accepted,
        };
        let id = Self::append_history(&tx, &entry)?;
        tx.execute(
            "UPDATE recipes SET score = score + ?1 WHERE id = ?2",
            params![decision.score_delta(), decision.recipe_id],
        )?;
        Self::evict_overflow(&tx)?;
        tx.commit()?;

        tracing::debug!(
            history_id = id,
            recipe_id = decision.recipe_id,
            accepted = decision.accepted,
            score_at_time,
            "recorded decision"
        );

        Ok(MealHistoryEntry {
            id,
            recipe_id: entry.recipe_id,
            date: entry.date,
            in_season: entry.in_season,
            score_at_time,
            accepted: entry.accepted,
        })
    }

    fn append_history(conn: &Connection, entry: &NewHistoryEntry) -> Result<i64> {
        conn.execute(
            "INSERT INTO meal_history (recipe_id, date, in_season, score_at_time, accepted)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.recipe_id,
                entry.date.format(DATE_FORMAT).to_string(),
                entry.in_season,
                entry.score_at_time,
                entry.accepted,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn evict_overflow(conn: &Connection) -> Result<usize> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM meal_history", [], |row| {
            row.get(0)
        })?;
        let overflow = count - HISTORY_CAPACITY;
        if overflow <= 0 {
            return Ok(0);
        }
        let evicted = conn.execute(
            "DELETE FROM meal_history WHERE id IN (
                SELECT id FROM meal_history ORDER BY id ASC LIMIT ?1
            )",
            params![overflow],
        )?;
        tracing::debug!(evicted, "evicted oldest history entries");
        Ok(evicted)
    }

    /// Drop history entries whose recipe no longer exists. Only a store edited
    /// outside this crate can hold such entries.
    pub fn prune_orphan_history(&self) -> Result<usize> {
        let pruned = self.conn.execute(
            "DELETE FROM meal_history WHERE recipe_id NOT IN (SELECT id FROM recipes)",
            [],
        )?;
        if pruned > 0 {
            tracing::info!(pruned, "pruned history entries for missing recipes");
        }
        Ok(pruned)
    }

    // --- Pantry storage ---

    /// Set the stocked quantity of an ingredient, replacing any previous amount.
    pub fn set_storage(&self, ingredient_name: &str, quantity: f64) -> Result<StoredIngredient> {
        if quantity <= 0.0 || !quantity.is_finite() {
            bail!("Quantity must be greater than 0");
        }
        let ingredient = self
            .get_ingredient(ingredient_name.trim())?
            .with_context(|| format!("Ingredient '{ingredient_name}' not found"))?;
        self.conn.execute(
            "INSERT OR REPLACE INTO storage (ingredient_name, quantity) VALUES (?1, ?2)",
            params![ingredient.name, quantity],
        )?;
        Ok(StoredIngredient {
            ingredient_name: ingredient.name,
            category: ingredient.category,
            quantity,
        })
    }

    pub fn remove_storage(&self, ingredient_name: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM storage WHERE ingredient_name = ?1",
            params![ingredient_name.trim()],
        )?;
        Ok(rows > 0)
    }

    pub fn list_storage(&self) -> Result<Vec<StoredIngredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.ingredient_name, i.category, s.quantity
             FROM storage s
             JOIN ingredients i ON s.ingredient_name = i.name
             ORDER BY s.ingredient_name",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StoredIngredient {
                    ingredient_name: row.get(0)?,
                    category: row.get(1)?,
                    quantity: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // --- Fridge and freezer ---

    fn compartment_table(compartment: Compartment) -> &'static str {
        match compartment {
            Compartment::Fridge => "fridge",
            Compartment::Freezer => "freezer",
        }
    }

    // Expects columns:
    // 0: recipe_id, 1: recipe name, 2: portions, 3: stored_on, 4: preservation_days
    fn stored_meal_from_row(
        compartment: Compartment,
        row: &rusqlite::Row,
    ) -> rusqlite::Result<StoredMeal> {
        let stored_on: String = row.get(3)?;
        let stored_on = NaiveDate::parse_from_str(&stored_on, DATE_FORMAT)
            .map_err(|e| Self::conversion_error(3, e))?;
        let preservation_days: i64 = row.get(4)?;
        let use_by = match compartment {
            Compartment::Fridge => Some(stored_on + chrono::Duration::days(preservation_days)),
            Compartment::Freezer => None,
        };
        Ok(StoredMeal {
            compartment,
            recipe_id: row.get(0)?,
            recipe_name: row.get(1)?,
            portions: row.get(2)?,
            stored_on,
            use_by,
        })
    }

    fn get_stored_meal(
        &self,
        compartment: Compartment,
        recipe_id: i64,
    ) -> Result<Option<StoredMeal>> {
        let table = Self::compartment_table(compartment);
        let meal = self
            .conn
            .query_row(
                &format!(
                    "SELECT s.recipe_id, r.name, s.portions, s.stored_on, r.preservation_days
                     FROM {table} s JOIN recipes r ON s.recipe_id = r.id
                     WHERE s.recipe_id = ?1"
                ),
                params![recipe_id],
                |row| Self::stored_meal_from_row(compartment, row),
            )
            .optional()?;
        Ok(meal)
    }

    /// Store cooked portions of a recipe, replacing any batch already there.
    /// Only freezable recipes go in the freezer.
    pub fn stock_meal(
        &self,
        compartment: Compartment,
        recipe_id: i64,
        portions: i64,
        stored_on: NaiveDate,
    ) -> Result<StoredMeal> {
        if portions <= 0 {
            bail!("Portions must be greater than 0");
        }
        let recipe = self.get_recipe_by_id(recipe_id)?;
        if compartment == Compartment::Freezer && !recipe.freezable {
            bail!("Recipe '{}' cannot be frozen", recipe.name);
        }
        let table = Self::compartment_table(compartment);
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {table} (recipe_id, portions, stored_on) VALUES (?1, ?2, ?3)"
            ),
            params![recipe_id, portions, stored_on.format(DATE_FORMAT).to_string()],
        )?;
        self.get_stored_meal(compartment, recipe_id)?
            .with_context(|| format!("Recipe '{}' not found in the {compartment}", recipe.name))
    }

    /// Take portions out. The batch is removed once it is empty, in which
    /// case `None` is returned.
    pub fn take_portions(
        &self,
        compartment: Compartment,
        recipe_id: i64,
        portions: i64,
    ) -> Result<Option<StoredMeal>> {
        if portions <= 0 {
            bail!("Portions must be greater than 0");
        }
        let Some(stored) = self.get_stored_meal(compartment, recipe_id)? else {
            bail!("No portions of recipe {recipe_id} in the {compartment}");
        };
        if portions > stored.portions {
            bail!(
                "Only {} portion(s) of '{}' in the {compartment}",
                stored.portions,
                stored.recipe_name
            );
        }
        let table = Self::compartment_table(compartment);
        let remaining = stored.portions - portions;
        if remaining == 0 {
            self.conn.execute(
                &format!("DELETE FROM {table} WHERE recipe_id = ?1"),
                params![recipe_id],
            )?;
            return Ok(None);
        }
        self.conn.execute(
            &format!("UPDATE {table} SET portions = ?1 WHERE recipe_id = ?2"),
            params![remaining, recipe_id],
        )?;
        Ok(Some(StoredMeal {
            portions: remaining,
            ..stored
        }))
    }

    pub fn remove_stored_meal(&self, compartment: Compartment, recipe_id: i64) -> Result<bool> {
        let table = Self::compartment_table(compartment);
        let rows = self.conn.execute(
            &format!("DELETE FROM {table} WHERE recipe_id = ?1"),
            params![recipe_id],
        )?;
        Ok(rows > 0)
    }

    pub fn list_stored_meals(&self, compartment: Compartment) -> Result<Vec<StoredMeal>> {
        let table = Self::compartment_table(compartment);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT s.recipe_id, r.name, s.portions, s.stored_on, r.preservation_days
             FROM {table} s JOIN recipes r ON s.recipe_id = r.id
             ORDER BY s.stored_on, r.name"
        ))?;
        let meals = stmt
            .query_map([], |row| Self::stored_meal_from_row(compartment, row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    // --- Weekly plan ---

    fn day_index(day: Weekday) -> i64 {
        i64::from(day.num_days_from_monday())
    }

    /// Replace the whole weekly plan in one transaction.
    pub fn save_week(&self, slots: &[WeekSlot]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM week_slot_participants", [])?;
        tx.execute("DELETE FROM week_slots", [])?;
        for slot in slots {
            let day = Self::day_index(slot.day);
            tx.execute(
                "INSERT INTO week_slots (day, meal, location, recipe_id) VALUES (?1, ?2, ?3, ?4)",
                params![day, slot.meal.as_str(), slot.location.as_str(), slot.recipe_id],
            )
            .with_context(|| format!("Duplicate week slot: {}", slot.label()))?;
            for name in &slot.participants {
                tx.execute(
                    "INSERT OR IGNORE INTO week_slot_participants (day, meal, profile_name)
                     VALUES (?1, ?2, ?3)",
                    params![day, slot.meal.as_str(), name],
                )?;
            }
        }
        tx.commit()?;
        tracing::info!(slots = slots.len(), "saved weekly plan");
        Ok(())
    }

    pub fn get_week(&self) -> Result<Vec<WeekSlot>> {
        let mut stmt = self.conn.prepare(
            "SELECT day, meal, location, recipe_id FROM week_slots
             ORDER BY day, CASE meal WHEN 'lunch' THEN 0 ELSE 1 END",
        )?;
        let slots = stmt
            .query_map([], |row| {
                let index: i64 = row.get(0)?;
                let day = usize::try_from(index)
                    .ok()
                    .and_then(|i| WEEK.get(i).copied())
                    .ok_or_else(|| {
                        Self::conversion_error(0, format!("Invalid week day index {index}"))
                    })?;
                let meal: String = row.get(1)?;
                let meal = MealTime::parse(&meal).map_err(|e| Self::conversion_error(1, e))?;
                let location: String = row.get(2)?;
                let location =
                    Location::parse(&location).map_err(|e| Self::conversion_error(2, e))?;
                Ok(WeekSlot {
                    day,
                    meal,
                    location,
                    participants: Vec::new(),
                    recipe_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut participants = self.conn.prepare(
            "SELECT profile_name FROM week_slot_participants
             WHERE day = ?1 AND meal = ?2 ORDER BY profile_name",
        )?;
        slots
            .into_iter()
            .map(|mut slot| {
                slot.participants = participants
                    .query_map(
                        params![Self::day_index(slot.day), slot.meal.as_str()],
                        |row| row.get(0),
                    )?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(slot)
            })
            .collect()
    }

    /// Set (or clear) the recipe planned for one slot. Returns false when the
    /// week has no such slot.
    pub fn assign_week_recipe(
        &self,
        day: Weekday,
        meal: MealTime,
        recipe_id: Option<i64>,
    ) -> Result<bool> {
        if let Some(id) = recipe_id {
            self.get_recipe_by_id(id)?;
        }
        let rows = self.conn.execute(
            "UPDATE week_slots SET recipe_id = ?1 WHERE day = ?2 AND meal = ?3",
            params![recipe_id, Self::day_index(day), meal.as_str()],
        )?;
        Ok(rows > 0)
    }

    pub fn set_week_location(
        &self,
        day: Weekday,
        meal: MealTime,
        location: Location,
    ) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE week_slots SET location = ?1 WHERE day = ?2 AND meal = ?3",
            params![location.as_str(), Self::day_index(day), meal.as_str()],
        )?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewRecipeIngredient;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flour() -> Ingredient {
        Ingredient {
            name: "Flour".to_string(),
            category: "cereal".to_string(),
            season: SeasonWindow::ALL_YEAR,
            contains_gluten: true,
        }
    }

    fn zucchini() -> Ingredient {
        Ingredient {
            name: "Zucchini".to_string(),
            category: "vegetables".to_string(),
            season: SeasonWindow::new(5, 9).unwrap(),
            contains_gluten: false,
        }
    }

    fn sample_recipe(name: &str, course: CourseType, ingredients: &[&str]) -> NewRecipe {
        NewRecipe {
            name: name.to_string(),
            course,
            prep_minutes: 30,
            portions: 4,
            preservation_days: 2,
            freezable: true,
            ingredients: ingredients
                .iter()
                .map(|n| NewRecipeIngredient {
                    ingredient_name: (*n).to_string(),
                    quantity: 100.0,
                })
                .collect(),
        }
    }

    #[test]
    fn test_insert_and_get_ingredient() {
        let db = Database::open_in_memory().unwrap();
        let inserted = db.insert_ingredient(&zucchini()).unwrap();
        assert_eq!(inserted.name, "Zucchini");
        assert_eq!(inserted.season, SeasonWindow::new(5, 9).unwrap());

        // Lookup is case-insensitive
        let fetched = db.get_ingredient("zucchini").unwrap().unwrap();
        assert_eq!(fetched, inserted);
        assert!(db.get_ingredient("Eggplant").unwrap().is_none());
    }

    #[test]
    fn test_insert_ingredient_validates() {
        let db = Database::open_in_memory().unwrap();
        let mut bad = flour();
        bad.category = "candy".to_string();
        assert!(db.insert_ingredient(&bad).is_err());

        let mut bad = flour();
        bad.season = SeasonWindow {
            start_month: 0,
            end_month: 4,
        };
        assert!(db.insert_ingredient(&bad).is_err());
    }

    #[test]
    fn test_insert_duplicate_ingredient_fails() {
        let db = Database::open_in_memory().unwrap();
        db.insert_ingredient(&flour()).unwrap();
        assert!(db.insert_ingredient(&flour()).is_err());
    }

    #[test]
    fn test_insert_recipe_with_ingredients() {
        let db = Database::open_in_memory().unwrap();
        db.insert_ingredient(&flour()).unwrap();
        db.insert_ingredient(&zucchini()).unwrap();

        let recipe = db
            .insert_recipe(&sample_recipe(
                "Zucchini Pie",
                CourseType::Single,
                &["flour", "Zucchini"],
            ))
            .unwrap();
        assert_eq!(recipe.course, CourseType::Single);
        assert_eq!(recipe.score, 0);

        let ingredients = db.get_recipe_ingredients(recipe.id).unwrap();
        assert_eq!(ingredients.len(), 2);
        assert_eq!(ingredients[0].ingredient_name, "Flour");
        assert!(ingredients[0].contains_gluten);
        assert!(!ingredients[1].contains_gluten);
        assert_eq!(ingredients[1].season.start_month, 5);
    }

    #[test]
    fn test_insert_recipe_unknown_ingredient_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        db.insert_ingredient(&flour()).unwrap();
        let result = db.insert_recipe(&sample_recipe(
            "Mystery",
            CourseType::Main,
            &["Flour", "Unobtainium"],
        ));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unobtainium"));
        assert!(db.get_all_recipes().unwrap().is_empty());
    }

    #[test]
    fn test_get_recipe_by_name() {
        let db = Database::open_in_memory().unwrap();
        let recipe = db
            .insert_recipe(&sample_recipe("Risotto", CourseType::Single, &[]))
            .unwrap();
        assert_eq!(db.get_recipe_by_name("risotto").unwrap().id, recipe.id);
        assert!(db.get_recipe_by_name("Paella").is_err());
    }

    #[test]
    fn test_delete_recipe_refused_while_in_history() {
        let db = Database::open_in_memory().unwrap();
        let recipe = db
            .insert_recipe(&sample_recipe("Stew", CourseType::Main, &[]))
            .unwrap();
        db.record_decision(&Decision {
            recipe_id: recipe.id,
            date: date(2024, 6, 15),
            in_season: true,
            accepted: true,
        })
        .unwrap();

        let err = db.delete_recipe(recipe.id).unwrap_err();
        assert!(err.to_string().contains("meal history"));
        assert_eq!(db.get_recipe_by_id(recipe.id).unwrap().name, "Stew");
        assert_eq!(db.history_references(recipe.id).unwrap(), 1);
    }

    #[test]
    fn test_delete_recipe_clears_inventory_and_week() {
        let db = Database::open_in_memory().unwrap();
        let recipe = db
            .insert_recipe(&sample_recipe("Chili", CourseType::Main, &[]))
            .unwrap();
        db.stock_meal(Compartment::Fridge, recipe.id, 2, date(2024, 3, 1))
            .unwrap();
        db.stock_meal(Compartment::Freezer, recipe.id, 3, date(2024, 3, 1))
            .unwrap();
        db.save_week(&[WeekSlot {
            day: Weekday::Tue,
            meal: MealTime::Dinner,
            location: Location::Home,
            participants: Vec::new(),
            recipe_id: Some(recipe.id),
        }])
        .unwrap();

        assert!(db.delete_recipe(recipe.id).unwrap());
        assert!(db.list_stored_meals(Compartment::Fridge).unwrap().is_empty());
        assert!(db.list_stored_meals(Compartment::Freezer).unwrap().is_empty());
        assert_eq!(db.get_week().unwrap()[0].recipe_id, None);
        assert!(!db.delete_recipe(recipe.id).unwrap());
    }

    #[test]
    fn test_prune_orphan_history() {
        let db = Database::open_in_memory().unwrap();
        let recipe = db
            .insert_recipe(&sample_recipe("Soup", CourseType::Single, &[]))
            .unwrap();
        for recipe_id in [recipe.id, 404, 405] {
            db.add_meal_history_entry(&NewHistoryEntry {
                recipe_id,
                date: date(2024, 2, 1),
                in_season: true,
                score_at_time: 0,
                accepted: true,
            })
            .unwrap();
        }

        assert_eq!(db.prune_orphan_history().unwrap(), 2);
        let history = db.get_meal_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].recipe_id, recipe.id);
        assert_eq!(db.prune_orphan_history().unwrap(), 0);
    }

    #[test]
    fn test_delete_ingredient_in_use_refused() {
        let db = Database::open_in_memory().unwrap();
        db.insert_ingredient(&flour()).unwrap();
        let recipe = db
            .insert_recipe(&sample_recipe("Bread", CourseType::Side, &["Flour"]))
            .unwrap();
        assert!(db.delete_ingredient("Flour").is_err());

        db.delete_recipe(recipe.id).unwrap();
        assert!(db.delete_ingredient("Flour").unwrap());
        assert!(!db.delete_ingredient("Flour").unwrap());
    }

    #[test]
    fn test_profiles_with_intolerances() {
        let db = Database::open_in_memory().unwrap();
        db.insert_profile(&Profile {
            name: "Alice".to_string(),
            celiac: false,
            intolerances: vec!["Beef".to_string(), "Carrot".to_string()],
        })
        .unwrap();
        db.insert_profile(&Profile {
            name: "Bob".to_string(),
            celiac: true,
            intolerances: vec![],
        })
        .unwrap();

        let alice = db.get_profile_by_name("alice").unwrap().unwrap();
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.intolerances, vec!["Beef", "Carrot"]);

        let all = db.get_all_profiles().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[1].celiac);

        assert!(db.delete_profile("Alice").unwrap());
        assert!(db.get_profile_by_name("Alice").unwrap().is_none());
    }

    #[test]
    fn test_record_decision_pairs_history_and_score() {
        let db = Database::open_in_memory().unwrap();
        let recipe = db
            .insert_recipe(&sample_recipe("Lasagna", CourseType::Single, &[]))
            .unwrap();

        let accepted = db
            .record_decision(&Decision {
                recipe_id: recipe.id,
                date: date(2024, 6, 15),
                in_season: true,
                accepted: true,
            })
            .unwrap();
        assert_eq!(accepted.score_at_time, 0);
        assert_eq!(db.get_recipe_by_id(recipe.id).unwrap().score, 1);

        let rejected = db
            .record_decision(&Decision {
                recipe_id: recipe.id,
                date: date(2024, 6, 16),
                in_season: false,
                accepted: false,
            })
            .unwrap();
        // Score snapshot is taken before this decision's update
        assert_eq!(rejected.score_at_time, 1);
        assert_eq!(db.get_recipe_by_id(recipe.id).unwrap().score, 0);

        let history = db.get_meal_history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], accepted);
        assert_eq!(history[1], rejected);
    }

    #[test]
    fn test_record_decision_unknown_recipe_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let result = db.record_decision(&Decision {
            recipe_id: 42,
            date: date(2024, 6, 15),
            in_season: true,
            accepted: true,
        });
        assert!(result.is_err());
        assert_eq!(db.history_len().unwrap(), 0);
    }

    #[test]
    fn test_history_capacity_evicts_lowest_id() {
        let db = Database::open_in_memory().unwrap();
        let recipe = db
            .insert_recipe(&sample_recipe("Soup", CourseType::Single, &[]))
            .unwrap();

        let mut first_id = None;
        for i in 0..HISTORY_CAPACITY {
            let entry = db
                .record_decision(&Decision {
                    recipe_id: recipe.id,
                    date: date(2024, 1, 1) + chrono::Duration::days(i),
                    in_season: true,
                    accepted: i % 2 == 0,
                })
                .unwrap();
            first_id.get_or_insert(entry.id);
        }
        assert_eq!(db.history_len().unwrap(), HISTORY_CAPACITY);

        let newest = db
            .record_decision(&Decision {
                recipe_id: recipe.id,
                date: date(2025, 1, 1),
                in_season: true,
                accepted: true,
            })
            .unwrap();
        let history = db.get_meal_history().unwrap();
        assert_eq!(history.len() as i64, HISTORY_CAPACITY);
        let first_id = first_id.unwrap();
        assert!(history.iter().all(|e| e.id != first_id));
        assert_eq!(history[0].id, first_id + 1);
        assert_eq!(history.last().unwrap().id, newest.id);
    }

    #[test]
    fn test_add_meal_history_entry_respects_capacity() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..=HISTORY_CAPACITY {
            db.add_meal_history_entry(&NewHistoryEntry {
                recipe_id: 1,
                date: date(2024, 1, 1),
                in_season: true,
                score_at_time: i,
                accepted: false,
            })
            .unwrap();
        }
        let history = db.get_meal_history().unwrap();
        assert_eq!(history.len() as i64, HISTORY_CAPACITY);
        // The entry with score_at_time 0 was the first inserted and is gone
        assert_eq!(history[0].score_at_time, 1);
    }

    #[test]
    fn test_update_recipe_score() {
        let db = Database::open_in_memory().unwrap();
        let recipe = db
            .insert_recipe(&sample_recipe("Salad", CourseType::Side, &[]))
            .unwrap();
        db.update_recipe_score(recipe.id, -1).unwrap();
        assert_eq!(db.get_recipe_by_id(recipe.id).unwrap().score, -1);
        assert!(db.update_recipe_score(999, 1).is_err());
    }

    #[test]
    fn test_storage_replaces_quantity() {
        let db = Database::open_in_memory().unwrap();
        db.insert_ingredient(&flour()).unwrap();

        db.set_storage("flour", 500.0).unwrap();
        let stored = db.set_storage("Flour", 250.0).unwrap();
        assert_eq!(stored.ingredient_name, "Flour");
        assert_eq!(stored.category, "cereal");

        let storage = db.list_storage().unwrap();
        assert_eq!(storage.len(), 1);
        assert!((storage[0].quantity - 250.0).abs() < f64::EPSILON);

        assert!(db.set_storage("Flour", 0.0).is_err());
        assert!(db.set_storage("Saffron", 1.0).is_err());
        assert!(db.remove_storage("FLOUR").unwrap());
        assert!(!db.remove_storage("Flour").unwrap());
    }

    #[test]
    fn test_delete_ingredient_clears_storage() {
        let db = Database::open_in_memory().unwrap();
        db.insert_ingredient(&zucchini()).unwrap();
        db.set_storage("Zucchini", 3.0).unwrap();

        assert!(db.delete_ingredient("Zucchini").unwrap());
        assert!(db.list_storage().unwrap().is_empty());
    }

    #[test]
    fn test_fridge_use_by_follows_preservation_days() {
        let db = Database::open_in_memory().unwrap();
        let recipe = db
            .insert_recipe(&sample_recipe("Lasagna", CourseType::Main, &[]))
            .unwrap();

        let stored = db
            .stock_meal(Compartment::Fridge, recipe.id, 4, date(2024, 3, 30))
            .unwrap();
        assert_eq!(stored.recipe_name, "Lasagna");
        assert_eq!(stored.use_by, Some(date(2024, 4, 1)));

        let frozen = db
            .stock_meal(Compartment::Freezer, recipe.id, 2, date(2024, 3, 30))
            .unwrap();
        assert_eq!(frozen.use_by, None);

        // Stocking again replaces the batch
        db.stock_meal(Compartment::Fridge, recipe.id, 1, date(2024, 4, 2))
            .unwrap();
        let fridge = db.list_stored_meals(Compartment::Fridge).unwrap();
        assert_eq!(fridge.len(), 1);
        assert_eq!(fridge[0].portions, 1);
        assert_eq!(fridge[0].stored_on, date(2024, 4, 2));
    }

    #[test]
    fn test_freezer_refuses_non_freezable() {
        let db = Database::open_in_memory().unwrap();
        let mut salad = sample_recipe("Salad", CourseType::Side, &[]);
        salad.freezable = false;
        let salad = db.insert_recipe(&salad).unwrap();

        let err = db
            .stock_meal(Compartment::Freezer, salad.id, 2, date(2024, 5, 1))
            .unwrap_err();
        assert!(err.to_string().contains("cannot be frozen"));
        assert!(db
            .stock_meal(Compartment::Fridge, salad.id, 2, date(2024, 5, 1))
            .is_ok());
        assert!(db
            .stock_meal(Compartment::Fridge, salad.id, 0, date(2024, 5, 1))
            .is_err());
        assert!(db
            .stock_meal(Compartment::Fridge, 999, 1, date(2024, 5, 1))
            .is_err());
    }

    #[test]
    fn test_take_portions_empties_batch() {
        let db = Database::open_in_memory().unwrap();
        let recipe = db
            .insert_recipe(&sample_recipe("Ragu", CourseType::Main, &[]))
            .unwrap();
        db.stock_meal(Compartment::Freezer, recipe.id, 3, date(2024, 1, 10))
            .unwrap();

        let left = db.take_portions(Compartment::Freezer, recipe.id, 2).unwrap();
        assert_eq!(left.map(|m| m.portions), Some(1));
        assert!(db.take_portions(Compartment::Freezer, recipe.id, 2).is_err());
        assert!(db
            .take_portions(Compartment::Freezer, recipe.id, 1)
            .unwrap()
            .is_none());
        assert!(db.list_stored_meals(Compartment::Freezer).unwrap().is_empty());
        assert!(db.take_portions(Compartment::Freezer, recipe.id, 1).is_err());
        assert!(!db.remove_stored_meal(Compartment::Freezer, recipe.id).unwrap());
    }

    #[test]
    fn test_week_round_trip_and_updates() {
        let db = Database::open_in_memory().unwrap();
        db.insert_profile(&Profile {
            name: "Alice".to_string(),
            celiac: false,
            intolerances: Vec::new(),
        })
        .unwrap();
        let recipe = db
            .insert_recipe(&sample_recipe("Tacos", CourseType::Main, &[]))
            .unwrap();
        db.save_week(&[
            WeekSlot {
                day: Weekday::Wed,
                meal: MealTime::Dinner,
                location: Location::Home,
                participants: vec!["Alice".to_string()],
                recipe_id: None,
            },
            WeekSlot {
                day: Weekday::Mon,
                meal: MealTime::Lunch,
                location: Location::Work,
                participants: Vec::new(),
                recipe_id: None,
            },
        ])
        .unwrap();

        let week = db.get_week().unwrap();
        assert_eq!(week.len(), 2);
        assert_eq!(week[0].day, Weekday::Mon);
        assert_eq!(week[1].participants, vec!["Alice".to_string()]);

        assert!(db
            .assign_week_recipe(Weekday::Wed, MealTime::Dinner, Some(recipe.id))
            .unwrap());
        assert!(!db
            .assign_week_recipe(Weekday::Wed, MealTime::Lunch, Some(recipe.id))
            .unwrap());
        assert!(db
            .assign_week_recipe(Weekday::Wed, MealTime::Dinner, Some(999))
            .is_err());
        assert!(db
            .set_week_location(Weekday::Mon, MealTime::Lunch, Location::Home)
            .unwrap());

        let week = db.get_week().unwrap();
        assert_eq!(week[0].location, Location::Home);
        assert_eq!(week[1].recipe_id, Some(recipe.id));

        db.delete_profile("alice").unwrap();
        assert!(db.get_week().unwrap()[1].participants.is_empty());

        // Saving again replaces the previous week
        db.save_week(&[]).unwrap();
        assert!(db.get_week().unwrap().is_empty());
    }

    #[test]
    fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persist.db");
        {
            let db = Database::open(&path).unwrap();
            db.insert_recipe(&sample_recipe("Curry", CourseType::Main, &[]))
                .unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_all_recipes().unwrap().len(), 1);
    }
}
