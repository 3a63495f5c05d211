use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, Weekday};
use serde::Serialize;
use std::process;

use supper_core::models::NewRecipeIngredient;
use supper_core::week::{MealTime, parse_day};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Parse `NAME` or `NAME:QTY`. A bare name means quantity 1.
pub(crate) fn parse_ingredient_arg(s: &str) -> Result<NewRecipeIngredient> {
    let (name, quantity) = match s.rsplit_once(':') {
        Some((name, qty)) => {
            let qty: f64 = qty
                .trim()
                .parse()
                .with_context(|| format!("Invalid quantity in '{s}'"))?;
            (name.trim(), qty)
        }
        None => (s.trim(), 1.0),
    };
    if name.is_empty() {
        bail!("Ingredient name must not be empty in '{s}'");
    }
    if quantity <= 0.0 {
        bail!("Quantity must be greater than 0 in '{s}'");
    }
    Ok(NewRecipeIngredient {
        ingredient_name: name.to_string(),
        quantity,
    })
}

/// Parse a week slot written as `DAY:MEAL`, e.g. `mon:dinner`.
pub(crate) fn parse_slot(s: &str) -> Result<(Weekday, MealTime)> {
    let Some((day, meal)) = s.split_once(':') else {
        bail!("Invalid slot '{s}'. Use DAY:MEAL, e.g. mon:dinner");
    };
    Ok((parse_day(day)?, MealTime::parse(meal)?))
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Report a missing entity and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

pub(crate) fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
