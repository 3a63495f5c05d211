use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use supper_core::classifier::{FallbackReason, Model, TrainedModel};
use supper_core::service::PlannerService;

use super::helpers::{parse_date, truncate};

fn describe_fallback(reason: &FallbackReason) -> String {
    match reason {
        FallbackReason::Empty => "no meal history yet".to_string(),
        FallbackReason::TooFewRows { rows, min } => {
            format!("only {rows} history entries, need at least {min}")
        }
        FallbackReason::SingleClass => "history holds only one kind of decision".to_string(),
        FallbackReason::Diverged => "training diverged".to_string(),
    }
}

fn print_model(trained: &TrainedModel) {
    match &trained.model {
        Model::Uniform { fallback } => {
            println!(
                "Model: uniform 0.5 for every recipe ({})",
                describe_fallback(fallback)
            );
        }
        Model::Logistic(_) => {
            println!("Model: logistic regression");
            if let Some(d) = &trained.diagnostics {
                let c = &d.confusion;
                println!(
                    "  Trained on {} rows, validated on {} rows, accuracy {:.1}%",
                    d.train_rows,
                    d.validation_rows,
                    d.accuracy * 100.0
                );
                println!(
                    "  Confusion: TN {}  FP {}  FN {}  TP {}",
                    c.true_negative, c.false_positive, c.false_negative, c.true_positive
                );
            }
        }
    }
}

pub(crate) fn cmd_rank(service: &PlannerService, date: Option<String>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct RankRow {
        #[tabled(rename = "#")]
        position: usize,
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Recipe")]
        name: String,
        #[tabled(rename = "Course")]
        course: String,
        #[tabled(rename = "P(accept)")]
        probability: String,
    }

    let today = parse_date(date)?;
    let ranking = service.rank(today)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "date": today.format("%Y-%m-%d").to_string(),
                "model": ranking.trained,
                "recipes": ranking.recipes,
            }))?
        );
        return Ok(());
    }

    print_model(&ranking.trained);
    if ranking.recipes.is_empty() {
        eprintln!("No recipes to rank. Use `supper recipe add` or `supper import recipes`.");
        return Ok(());
    }

    let rows: Vec<RankRow> = ranking
        .recipes
        .iter()
        .enumerate()
        .map(|(i, r)| RankRow {
            position: i + 1,
            id: r.recipe_id,
            name: truncate(&r.name, 30),
            course: r.course.to_string(),
            probability: format!("{:.3}", r.probability),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..5)).with(Alignment::right()))
        .to_string();
    println!("\nRanking for {}:", today.format("%Y-%m-%d"));
    println!("{table}");
    Ok(())
}
