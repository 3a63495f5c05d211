use std::collections::HashSet;
use std::io::Read;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::db::Database;
use crate::models::{CourseType, Ingredient, NewRecipe, NewRecipeIngredient, SeasonWindow};

/// Summary of what a catalog import would do / did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogImportSummary {
    pub rows_parsed: usize,
    pub created: usize,
    /// Rows whose name already exists (in the store or earlier in the file).
    pub skipped: usize,
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .with_context(|| format!("Missing required column: {name}"))
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "" | "0" | "false" | "no" | "n" => Ok(false),
        "1" | "true" | "yes" | "y" => Ok(true),
        other => bail!("Invalid boolean '{other}'"),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, column: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| anyhow::anyhow!("Invalid {column} '{value}'"))
}

/// Parse an ingredient CSV.
///
/// Expected header: `name,category,season_start,season_end,contains_gluten`.
/// Empty season columns mean all year.
pub fn parse_ingredients_csv<R: Read>(reader: R) -> Result<Vec<Ingredient>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

    let idx_name = column_index(&headers, "name")?;
    let idx_category = column_index(&headers, "category")?;
    let idx_start = column_index(&headers, "season_start")?;
    let idx_end = column_index(&headers, "season_end")?;
    let idx_gluten = column_index(&headers, "contains_gluten")?;

    let mut rows = Vec::new();
    for (line_num, result) in rdr.records().enumerate() {
        let line = line_num + 2;
        let record = result.with_context(|| format!("Failed to parse CSV row {line}"))?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let name = field(idx_name);
        if name.is_empty() {
            continue;
        }
        let month = |idx: usize, default: u32| -> Result<u32> {
            let raw = field(idx);
            if raw.is_empty() {
                Ok(default)
            } else {
                parse_number(raw, "month")
            }
        };
        let season = SeasonWindow::new(month(idx_start, 1)?, month(idx_end, 12)?)
            .with_context(|| format!("Row {line}"))?;

        rows.push(Ingredient {
            name: name.to_string(),
            category: field(idx_category).to_string(),
            season,
            contains_gluten: parse_flag(field(idx_gluten))
                .with_context(|| format!("Row {line}"))?,
        });
    }
    Ok(rows)
}

/// Parse `name:qty;name:qty`. A bare name counts as quantity 1.
fn parse_ingredient_list(value: &str) -> Result<Vec<NewRecipeIngredient>> {
    value
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (name, quantity) = match part.rsplit_once(':') {
                Some((name, qty)) => (name.trim(), parse_number::<f64>(qty, "quantity")?),
                None => (part, 1.0),
            };
            if name.is_empty() {
                bail!("Empty ingredient name in '{part}'");
            }
            Ok(NewRecipeIngredient {
                ingredient_name: name.to_string(),
                quantity,
            })
        })
        .collect()
}

struct RecipeColumns {
    course: usize,
    prep_minutes: usize,
    portions: usize,
    preservation_days: usize,
    freezable: usize,
    ingredients: usize,
}

fn recipe_from_fields<'r>(
    name: &str,
    field: &impl Fn(usize) -> &'r str,
    columns: &RecipeColumns,
) -> Result<NewRecipe> {
    Ok(NewRecipe {
        name: name.to_string(),
        course: CourseType::parse(field(columns.course))?,
        prep_minutes: parse_number(field(columns.prep_minutes), "prep_minutes")?,
        portions: parse_number(field(columns.portions), "portions")?,
        preservation_days: parse_number(field(columns.preservation_days), "preservation_days")?,
        freezable: parse_flag(field(columns.freezable))?,
        ingredients: parse_ingredient_list(field(columns.ingredients))?,
    })
}

/// Parse a recipe CSV.
///
/// Expected header:
/// `name,course,prep_minutes,portions,preservation_days,freezable,ingredients`
pub fn parse_recipes_csv<R: Read>(reader: R) -> Result<Vec<NewRecipe>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

    let idx_name = column_index(&headers, "name")?;
    let columns = RecipeColumns {
        course: column_index(&headers, "course")?,
        prep_minutes: column_index(&headers, "prep_minutes")?,
        portions: column_index(&headers, "portions")?,
        preservation_days: column_index(&headers, "preservation_days")?,
        freezable: column_index(&headers, "freezable")?,
        ingredients: column_index(&headers, "ingredients")?,
    };

    let mut rows = Vec::new();
    for (line_num, result) in rdr.records().enumerate() {
        let line = line_num + 2;
        let record = result.with_context(|| format!("Failed to parse CSV row {line}"))?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let name = field(idx_name);
        if name.is_empty() {
            continue;
        }
        let recipe = recipe_from_fields(name, &field, &columns)
            .with_context(|| format!("Row {line}"))?;
        rows.push(recipe);
    }
    Ok(rows)
}

/// Insert parsed ingredients. Names already present are skipped, never
/// overwritten. When `dry_run` is true, no data is written.
pub fn import_ingredients(
    db: &Database,
    rows: &[Ingredient],
    dry_run: bool,
) -> Result<CatalogImportSummary> {
    let mut summary = CatalogImportSummary {
        rows_parsed: rows.len(),
        ..CatalogImportSummary::default()
    };
    let mut seen: HashSet<String> = HashSet::new();

    for row in rows {
        let key = row.name.to_lowercase();
        if !seen.insert(key) || db.get_ingredient(&row.name)?.is_some() {
            summary.skipped += 1;
            continue;
        }
        if dry_run {
            crate::models::validate_category(&row.category)
                .with_context(|| format!("Ingredient '{}'", row.name))?;
        } else {
            db.insert_ingredient(row)?;
        }
        summary.created += 1;
    }

    tracing::info!(
        created = summary.created,
        skipped = summary.skipped,
        dry_run,
        "imported ingredients"
    );
    Ok(summary)
}

/// Insert parsed recipes. Every ingredient must already exist; names already
/// present are skipped. When `dry_run` is true, no data is written.
pub fn import_recipes(
    db: &Database,
    rows: &[NewRecipe],
    dry_run: bool,
) -> Result<CatalogImportSummary> {
    let mut summary = CatalogImportSummary {
        rows_parsed: rows.len(),
        ..CatalogImportSummary::default()
    };
    let mut seen: HashSet<String> = HashSet::new();

    for row in rows {
        let key = row.name.to_lowercase();
        if !seen.insert(key) || db.find_recipe_by_name(&row.name)?.is_some() {
            summary.skipped += 1;
            continue;
        }
        if dry_run {
            row.validate()
                .with_context(|| format!("Recipe '{}'", row.name))?;
            for link in &row.ingredients {
                if db.get_ingredient(&link.ingredient_name)?.is_none() {
                    bail!(
                        "Unknown ingredient '{}' in recipe '{}'",
                        link.ingredient_name,
                        row.name
                    );
                }
            }
        } else {
            db.insert_recipe(row)?;
        }
        summary.created += 1;
    }

    tracing::info!(
        created = summary.created,
        skipped = summary.skipped,
        dry_run,
        "imported recipes"
    );
    Ok(summary)
}
