use std::collections::HashMap;

use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use supper_core::service::PlannerService;
use supper_core::week::{Location, MealTime, WeekSetupOutcome, WeekSlot, day_name, parse_day};

use super::helpers::{exit_not_found, truncate};
use crate::prompt::LinePrompter;

fn print_week(slots: &[WeekSlot], recipe_names: &HashMap<i64, String>) {
    #[derive(Tabled)]
    struct SlotRow {
        #[tabled(rename = "Day")]
        day: &'static str,
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Where")]
        location: String,
        #[tabled(rename = "Who")]
        participants: String,
        #[tabled(rename = "Recipe")]
        recipe: String,
    }

    let rows: Vec<SlotRow> = slots
        .iter()
        .map(|s| SlotRow {
            day: day_name(s.day),
            meal: s.meal.to_string(),
            location: s.location.to_string(),
            participants: if s.participants.is_empty() {
                "-".to_string()
            } else {
                s.participants.join(", ")
            },
            recipe: s.recipe_id.map_or_else(
                || "-".to_string(),
                |id| {
                    recipe_names
                        .get(&id)
                        .map_or_else(|| format!("#{id}"), |n| truncate(n, 30))
                },
            ),
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
}

fn recipe_names(service: &PlannerService) -> Result<HashMap<i64, String>> {
    Ok(service
        .db()
        .get_all_recipes()?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect())
}

pub(crate) fn cmd_week_plan(service: &PlannerService, json: bool) -> Result<()> {
    let mut prompter = LinePrompter::stdio();
    let outcome = service.plan_week(&mut prompter)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!();
    match &outcome {
        WeekSetupOutcome::Planned { slots } => {
            println!("=== Weekly plan saved ===");
            print_week(slots, &recipe_names(service)?);
        }
        WeekSetupOutcome::Aborted { completed } => {
            println!(
                "Week planning aborted after {completed} slot(s); the saved plan is unchanged."
            );
        }
    }
    Ok(())
}

pub(crate) fn cmd_week_show(service: &PlannerService, json: bool) -> Result<()> {
    let slots = service.week()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&slots)?);
        return Ok(());
    }
    if slots.is_empty() {
        eprintln!("No weekly plan yet. Use `supper week plan`.");
        return Ok(());
    }
    print_week(&slots, &recipe_names(service)?);
    Ok(())
}

pub(crate) fn cmd_week_assign(
    service: &PlannerService,
    day: &str,
    meal: &str,
    recipe_name: &str,
    json: bool,
) -> Result<()> {
    let day = parse_day(day)?;
    let meal = MealTime::parse(meal)?;
    let db = service.db();
    let Some(recipe) = db.find_recipe_by_name(recipe_name)? else {
        exit_not_found(&format!("Recipe '{recipe_name}' not found"), json);
    };
    if !db.assign_week_recipe(day, meal, Some(recipe.id))? {
        exit_not_found(
            &format!("{} {meal} is not in the weekly plan", day_name(day)),
            json,
        );
    }
    if json {
        println!(
            "{}",
            serde_json::json!({ "day": day_name(day), "meal": meal, "recipe": recipe.name })
        );
    } else {
        println!("{} {meal}: '{}'", day_name(day), recipe.name);
    }
    Ok(())
}

pub(crate) fn cmd_week_location(
    service: &PlannerService,
    day: &str,
    meal: &str,
    location: &str,
    json: bool,
) -> Result<()> {
    let day = parse_day(day)?;
    let meal = MealTime::parse(meal)?;
    let location = Location::parse(location)?;
    if !service.db().set_week_location(day, meal, location)? {
        exit_not_found(
            &format!("{} {meal} is not in the weekly plan", day_name(day)),
            json,
        );
    }
    if json {
        println!(
            "{}",
            serde_json::json!({ "day": day_name(day), "meal": meal, "location": location })
        );
    } else {
        println!("{} {meal} is eaten at {location}", day_name(day));
    }
    Ok(())
}
