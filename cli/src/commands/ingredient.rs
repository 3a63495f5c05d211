use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use supper_core::db::Database;
use supper_core::models::{Ingredient, SeasonWindow};

use super::helpers::{exit_not_found, truncate, yes_no};

pub(crate) fn cmd_ingredient_add(
    db: &Database,
    name: &str,
    category: &str,
    season_start: u32,
    season_end: u32,
    gluten: bool,
    json: bool,
) -> Result<()> {
    let ingredient = db.insert_ingredient(&Ingredient {
        name: name.to_string(),
        category: category.to_string(),
        season: SeasonWindow::new(season_start, season_end)?,
        contains_gluten: gluten,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ingredient)?);
    } else {
        println!(
            "Added {} ({}, months {}-{}{})",
            ingredient.name,
            ingredient.category,
            ingredient.season.start_month,
            ingredient.season.end_month,
            if ingredient.contains_gluten {
                ", gluten"
            } else {
                ""
            }
        );
    }
    Ok(())
}

pub(crate) fn cmd_ingredient_list(db: &Database, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct IngredientRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Season")]
        season: String,
        #[tabled(rename = "Gluten")]
        gluten: &'static str,
    }

    let ingredients = db.list_ingredients()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ingredients)?);
        return Ok(());
    }
    if ingredients.is_empty() {
        eprintln!("No ingredients yet. Use `supper ingredient add` or `supper import ingredients`.");
        return Ok(());
    }

    let rows: Vec<IngredientRow> = ingredients
        .iter()
        .map(|i| IngredientRow {
            name: truncate(&i.name, 30),
            category: i.category.clone(),
            season: if i.season == SeasonWindow::ALL_YEAR {
                "all year".to_string()
            } else {
                format!("{}-{}", i.season.start_month, i.season.end_month)
            },
            gluten: yes_no(i.contains_gluten),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_ingredient_delete(db: &Database, name: &str, json: bool) -> Result<()> {
    if !db.delete_ingredient(name)? {
        exit_not_found(&format!("Ingredient '{name}' not found"), json);
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": name }));
    } else {
        println!("Deleted ingredient {name}");
    }
    Ok(())
}
