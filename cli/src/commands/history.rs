use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use supper_core::db::Database;
use supper_core::models::{HISTORY_CAPACITY, MealHistoryEntry};

use super::helpers::{truncate, yes_no};

/// Most recent entries last, matching insertion order.
fn tail(history: &[MealHistoryEntry], limit: Option<usize>) -> &[MealHistoryEntry] {
    match limit {
        Some(n) if n < history.len() => &history[history.len() - n..],
        _ => history,
    }
}

/// Drop entries whose recipe is gone so training can run again.
pub(crate) fn cmd_history_prune(db: &Database, json: bool) -> Result<()> {
    let pruned = db.prune_orphan_history()?;
    if json {
        println!("{}", serde_json::json!({ "pruned": pruned }));
    } else if pruned == 0 {
        println!("Every history entry refers to a known recipe; nothing to prune.");
    } else {
        println!("Pruned {pruned} history entries for missing recipes");
    }
    Ok(())
}

pub(crate) fn cmd_history(db: &Database, limit: Option<usize>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Recipe")]
        recipe: String,
        #[tabled(rename = "In season")]
        in_season: &'static str,
        #[tabled(rename = "Score")]
        score: i64,
        #[tabled(rename = "Accepted")]
        accepted: &'static str,
    }

    let history = db.get_meal_history()?;
    let shown = tail(&history, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }
    if shown.is_empty() {
        eprintln!("No meal history yet. Run `supper plan` to start recording decisions.");
        return Ok(());
    }

    let names: std::collections::HashMap<i64, String> = db
        .get_all_recipes()?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect();

    let rows: Vec<HistoryRow> = shown
        .iter()
        .map(|e| HistoryRow {
            id: e.id,
            date: e.date.format("%Y-%m-%d").to_string(),
            recipe: names
                .get(&e.recipe_id)
                .map_or_else(|| format!("(missing #{})", e.recipe_id), |n| truncate(n, 30)),
            in_season: yes_no(e.in_season),
            score: e.score_at_time,
            accepted: yes_no(e.accepted),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    println!("{} of {} entries (capacity {HISTORY_CAPACITY})", shown.len(), history.len());
    Ok(())
}
