use std::path::Path;

use anyhow::{Context, Result};

use supper_core::catalog_import::CatalogImportSummary;
use supper_core::service::PlannerService;

fn open(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))
}

fn print_summary(kind: &str, summary: &CatalogImportSummary, dry_run: bool, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "kind": kind,
                "dry_run": dry_run,
                "rows_parsed": summary.rows_parsed,
                "created": summary.created,
                "skipped": summary.skipped,
            })
        );
    } else if dry_run {
        println!("Dry run, no changes made.\n");
        println!("  Rows parsed:  {}", summary.rows_parsed);
        println!("  {kind} to create: {}", summary.created);
        println!("  Already present: {}", summary.skipped);
    } else {
        println!("Import complete.\n");
        println!("  Rows parsed:  {}", summary.rows_parsed);
        println!("  {kind} created: {}", summary.created);
        println!("  Skipped (already present): {}", summary.skipped);
    }
}

pub(crate) fn cmd_import_ingredients(
    service: &PlannerService,
    path: &Path,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let summary = service.import_ingredients_csv(open(path)?, dry_run)?;
    print_summary("Ingredients", &summary, dry_run, json);
    Ok(())
}

pub(crate) fn cmd_import_recipes(
    service: &PlannerService,
    path: &Path,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let summary = service.import_recipes_csv(open(path)?, dry_run)?;
    print_summary("Recipes", &summary, dry_run, json);
    Ok(())
}
