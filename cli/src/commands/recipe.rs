use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use supper_core::db::Database;
use supper_core::models::{CourseType, NewRecipe};

use super::helpers::{exit_not_found, parse_ingredient_arg, truncate, yes_no};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_recipe_add(
    db: &Database,
    name: &str,
    course: &str,
    prep_minutes: i64,
    portions: i64,
    preservation_days: i64,
    freezable: bool,
    ingredients: &[String],
    json: bool,
) -> Result<()> {
    let ingredients = ingredients
        .iter()
        .map(|s| parse_ingredient_arg(s))
        .collect::<Result<Vec<_>>>()?;

    let recipe = db.insert_recipe(&NewRecipe {
        name: name.to_string(),
        course: CourseType::parse(course)?,
        prep_minutes,
        portions,
        preservation_days,
        freezable,
        ingredients,
    })?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&db.get_recipe_detail(recipe.id)?)?
        );
    } else {
        println!(
            "Created recipe '{}' (ID: {}, {})",
            recipe.name, recipe.id, recipe.course
        );
    }
    Ok(())
}

pub(crate) fn cmd_recipe_show(db: &Database, recipe_name: &str, json: bool) -> Result<()> {
    let Some(recipe) = db.find_recipe_by_name(recipe_name)? else {
        exit_not_found(&format!("Recipe '{recipe_name}' not found"), json);
    };
    let detail = db.get_recipe_detail(recipe.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let r = &detail.recipe;
    println!("=== {} ===", r.name);
    println!(
        "  {}  |  {} min  |  {} portions  |  keeps {} days  |  freezable: {}  |  score: {}\n",
        r.course,
        r.prep_minutes,
        r.portions,
        r.preservation_days,
        yes_no(r.freezable),
        r.score
    );

    println!("  INGREDIENTS:");
    if detail.ingredients.is_empty() {
        println!("    (none)");
    }
    for ing in &detail.ingredients {
        let gluten = if ing.contains_gluten { "  [gluten]" } else { "" };
        println!(
            "    {} - {} (months {}-{}){gluten}",
            ing.ingredient_name, ing.quantity, ing.season.start_month, ing.season.end_month
        );
    }
    Ok(())
}

pub(crate) fn cmd_recipe_list(db: &Database, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Course")]
        course: String,
        #[tabled(rename = "Prep (min)")]
        prep: i64,
        #[tabled(rename = "Portions")]
        portions: i64,
        #[tabled(rename = "Keeps (d)")]
        keeps: i64,
        #[tabled(rename = "Freezable")]
        freezable: &'static str,
        #[tabled(rename = "Score")]
        score: i64,
    }

    let recipes = db.get_all_recipes()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }
    if recipes.is_empty() {
        eprintln!("No recipes yet. Use `supper recipe add` or `supper import recipes`.");
        return Ok(());
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: r.id,
            name: truncate(&r.name, 30),
            course: r.course.to_string(),
            prep: r.prep_minutes,
            portions: r.portions,
            keeps: r.preservation_days,
            freezable: yes_no(r.freezable),
            score: r.score,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..6)).with(Alignment::right()))
        .with(Modify::new(Columns::new(7..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_recipe_delete(db: &Database, recipe_name: &str, json: bool) -> Result<()> {
    let Some(recipe) = db.find_recipe_by_name(recipe_name)? else {
        exit_not_found(&format!("Recipe '{recipe_name}' not found"), json);
    };
    db.delete_recipe(recipe.id)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "deleted": recipe.name, "id": recipe.id })
        );
    } else {
        println!("Deleted recipe '{}' (ID: {})", recipe.name, recipe.id);
    }
    Ok(())
}
