use anyhow::Result;
use chrono::NaiveDate;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use supper_core::db::Database;
use supper_core::models::{Compartment, Recipe};

use super::helpers::{exit_not_found, parse_date, truncate};

fn find_recipe(db: &Database, recipe_name: &str, json: bool) -> Result<Recipe> {
    match db.find_recipe_by_name(recipe_name)? {
        Some(recipe) => Ok(recipe),
        None => exit_not_found(&format!("Recipe '{recipe_name}' not found"), json),
    }
}

// --- Pantry storage ---

pub(crate) fn cmd_storage_set(
    db: &Database,
    ingredient: &str,
    quantity: f64,
    json: bool,
) -> Result<()> {
    let stored = db.set_storage(ingredient, quantity)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
    } else {
        println!("Storage: {} x {}", stored.ingredient_name, stored.quantity);
    }
    Ok(())
}

pub(crate) fn cmd_storage_remove(db: &Database, ingredient: &str, json: bool) -> Result<()> {
    if !db.remove_storage(ingredient)? {
        exit_not_found(&format!("'{ingredient}' is not in storage"), json);
    }
    if json {
        println!("{}", serde_json::json!({ "removed": ingredient }));
    } else {
        println!("Removed {ingredient} from storage");
    }
    Ok(())
}

pub(crate) fn cmd_storage_list(db: &Database, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct StorageRow {
        #[tabled(rename = "Ingredient")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Quantity")]
        quantity: f64,
    }

    let storage = db.list_storage()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&storage)?);
        return Ok(());
    }
    if storage.is_empty() {
        eprintln!("Storage is empty. Use `supper storage set <ingredient> <quantity>`.");
        return Ok(());
    }

    let rows: Vec<StorageRow> = storage
        .into_iter()
        .map(|s| StorageRow {
            name: truncate(&s.ingredient_name, 30),
            category: s.category,
            quantity: s.quantity,
        })
        .collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

// --- Fridge and freezer ---

pub(crate) fn cmd_compartment_add(
    db: &Database,
    compartment: Compartment,
    recipe_name: &str,
    portions: i64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let stored_on = parse_date(date)?;
    let recipe = find_recipe(db, recipe_name, json)?;
    let stored = db.stock_meal(compartment, recipe.id, portions, stored_on)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(());
    }
    println!(
        "Stored {} portion(s) of '{}' in the {compartment}",
        stored.portions, stored.recipe_name
    );
    if let Some(use_by) = stored.use_by {
        println!("  Use by {}", use_by.format("%Y-%m-%d"));
    }
    Ok(())
}

pub(crate) fn cmd_compartment_take(
    db: &Database,
    compartment: Compartment,
    recipe_name: &str,
    portions: i64,
    json: bool,
) -> Result<()> {
    let recipe = find_recipe(db, recipe_name, json)?;
    let remaining = db.take_portions(compartment, recipe.id, portions)?;
    let left = remaining.as_ref().map_or(0, |m| m.portions);
    if json {
        println!(
            "{}",
            serde_json::json!({ "recipe": recipe.name, "taken": portions, "remaining": left })
        );
    } else {
        println!(
            "Took {portions} portion(s) of '{}' from the {compartment}, {left} left",
            recipe.name
        );
    }
    Ok(())
}

pub(crate) fn cmd_compartment_remove(
    db: &Database,
    compartment: Compartment,
    recipe_name: &str,
    json: bool,
) -> Result<()> {
    let recipe = find_recipe(db, recipe_name, json)?;
    if !db.remove_stored_meal(compartment, recipe.id)? {
        exit_not_found(
            &format!("'{}' is not in the {compartment}", recipe.name),
            json,
        );
    }
    if json {
        println!("{}", serde_json::json!({ "removed": recipe.name }));
    } else {
        println!("Removed '{}' from the {compartment}", recipe.name);
    }
    Ok(())
}

fn use_by_label(use_by: Option<NaiveDate>, today: NaiveDate) -> String {
    match use_by {
        None => "-".to_string(),
        Some(date) if today > date => format!("{} (expired)", date.format("%Y-%m-%d")),
        Some(date) => date.format("%Y-%m-%d").to_string(),
    }
}

pub(crate) fn cmd_compartment_list(
    db: &Database,
    compartment: Compartment,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct StoredRow {
        #[tabled(rename = "Recipe")]
        recipe: String,
        #[tabled(rename = "Portions")]
        portions: i64,
        #[tabled(rename = "Stored")]
        stored_on: String,
        #[tabled(rename = "Use by")]
        use_by: String,
    }

    let today = parse_date(date)?;
    let meals = db.list_stored_meals(compartment)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
        return Ok(());
    }
    if meals.is_empty() {
        eprintln!("The {compartment} is empty.");
        return Ok(());
    }

    let expired = meals.iter().filter(|m| m.is_expired(today)).count();
    let rows: Vec<StoredRow> = meals
        .iter()
        .map(|m| StoredRow {
            recipe: truncate(&m.recipe_name, 30),
            portions: m.portions,
            stored_on: m.stored_on.format("%Y-%m-%d").to_string(),
            use_by: use_by_label(m.use_by, today),
        })
        .collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    if expired > 0 {
        println!("{expired} batch(es) past their use-by date");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_use_by_label() {
        let today = date(2024, 4, 2);
        assert_eq!(use_by_label(None, today), "-");
        assert_eq!(use_by_label(Some(date(2024, 4, 2)), today), "2024-04-02");
        assert_eq!(
            use_by_label(Some(date(2024, 4, 1)), today),
            "2024-04-01 (expired)"
        );
    }
}
