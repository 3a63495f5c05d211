use anyhow::Result;

use supper_core::models::{MealHistoryEntry, Profile};
use supper_core::selection::SelectionOutcome;
use supper_core::service::PlannerService;

use supper_core::week::day_name;

use super::helpers::{parse_date, parse_slot};
use crate::prompt::LinePrompter;

fn names(participants: &[Profile]) -> String {
    participants
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_decisions(decisions: &[MealHistoryEntry]) {
    let accepted = decisions.iter().filter(|d| d.accepted).count();
    println!(
        "  Recorded {} decision(s): {accepted} accepted, {} rejected",
        decisions.len(),
        decisions.len() - accepted
    );
}

pub(crate) fn cmd_plan(
    service: &PlannerService,
    date: Option<String>,
    slot: Option<String>,
    json: bool,
) -> Result<()> {
    let today = parse_date(date)?;
    let slot = slot.as_deref().map(parse_slot).transpose()?;
    let mut prompter = LinePrompter::stdio();
    let outcome = match slot {
        Some((day, meal)) => service.plan_slot(&mut prompter, today, day, meal)?,
        None => service.plan_meal(&mut prompter, today)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!();
    match &outcome {
        SelectionOutcome::Selected(selection) => {
            println!("=== Meal for {} ===", today.format("%Y-%m-%d"));
            println!("  For:   {}", names(&selection.participants));
            println!("  Main:  {} ({})", selection.main.name, selection.main.course);
            if selection.sides.is_empty() {
                println!("  Sides: none");
            } else {
                let sides: Vec<&str> = selection.sides.iter().map(|s| s.name.as_str()).collect();
                println!("  Sides: {}", sides.join(", "));
            }
            if let Some((day, meal)) = slot {
                println!("  Planned for {} {meal}", day_name(day));
            }
            print_decisions(&selection.decisions);
        }
        SelectionOutcome::NoSuitableMeal {
            participants,
            decisions,
        } => {
            println!("No suitable meal found for {}.", names(participants));
            print_decisions(decisions);
        }
        SelectionOutcome::NoParticipants { attempts } => {
            if *attempts == 0 {
                println!("No profiles exist. Use `supper profile add <name>` first.");
            } else {
                println!("No participants confirmed after {attempts} attempt(s).");
            }
        }
        SelectionOutcome::Aborted { decisions } => {
            println!("Selection aborted.");
            print_decisions(decisions);
        }
    }
    Ok(())
}
