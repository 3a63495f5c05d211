mod commands;
mod config;
mod prompt;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_compartment_add, cmd_compartment_list, cmd_compartment_remove, cmd_compartment_take,
    cmd_history, cmd_history_prune, cmd_import_ingredients, cmd_import_recipes,
    cmd_ingredient_add, cmd_ingredient_delete, cmd_ingredient_list, cmd_plan, cmd_profile_add,
    cmd_profile_delete, cmd_profile_list, cmd_rank, cmd_recipe_add, cmd_recipe_delete,
    cmd_recipe_list, cmd_recipe_show, cmd_storage_list, cmd_storage_remove, cmd_storage_set,
    cmd_week_assign, cmd_week_location, cmd_week_plan, cmd_week_show,
};
use crate::config::Config;
use supper_core::db::Database;
use supper_core::models::Compartment;
use supper_core::service::PlannerService;

#[derive(Parser)]
#[command(
    name = "supper",
    version,
    about = "Pick tonight's meal from what your household actually likes",
    long_about = r"
  ___ _   _ _ __  _ __   ___ _ __
 / __| | | | '_ \| '_ \ / _ \ '__|
 \__ \ |_| | |_) | |_) |  __/ |
 |___/\__,_| .__/| .__/ \___|_|
           |_|   |_|
      what are we eating tonight?
"
)]
struct Cli {
    /// Database file (default: platform data dir)
    #[arg(long, global = true, env = "SUPPER_DB", value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage ingredients
    Ingredient {
        #[command(subcommand)]
        command: IngredientCommands,
    },
    /// Manage recipes
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Manage household profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Show the accept/reject history
    History {
        /// Only show the most recent N entries
        #[arg(short, long)]
        limit: Option<usize>,
        /// Remove entries whose recipe no longer exists instead of listing
        #[arg(long, conflicts_with = "limit")]
        prune: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Track raw ingredients in the pantry
    Storage {
        #[command(subcommand)]
        command: StorageCommands,
    },
    /// Track cooked portions kept in the fridge
    Fridge {
        #[command(subcommand)]
        command: CompartmentCommands,
    },
    /// Track cooked portions kept in the freezer (freezable recipes only)
    Freezer {
        #[command(subcommand)]
        command: CompartmentCommands,
    },
    /// Lay out the week's lunches and dinners
    Week {
        #[command(subcommand)]
        command: WeekCommands,
    },
    /// Bulk import catalog data from CSV
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Train on the history and show every recipe ranked by acceptance probability
    Rank {
        /// Date to rank for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactively pick a meal (answer q at any prompt to stop)
    Plan {
        /// Date to plan for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Record the chosen main dish in this weekly slot (DAY:MEAL, e.g. mon:dinner)
        #[arg(long, value_name = "DAY:MEAL")]
        slot: Option<String>,
        /// Output the final selection as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum IngredientCommands {
    /// Add an ingredient
    Add {
        /// Ingredient name
        name: String,
        /// Category: beef, pork, chicken, fish, vegetables, animal origin, legumes, cereal, fruit, other
        #[arg(short, long)]
        category: String,
        /// First month of the season (1-12)
        #[arg(long, default_value = "1")]
        season_start: u32,
        /// Last month of the season (1-12, may be before the start to wrap the year)
        #[arg(long, default_value = "12")]
        season_end: u32,
        /// The ingredient contains gluten
        #[arg(long)]
        gluten: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all ingredients
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an ingredient no recipe uses
    Delete {
        /// Ingredient name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// Add a recipe
    Add {
        /// Recipe name
        name: String,
        /// Course: single, main, side
        #[arg(short, long)]
        course: String,
        /// Preparation time in minutes
        #[arg(long)]
        prep: i64,
        /// Number of portions
        #[arg(short, long, default_value = "1")]
        portions: i64,
        /// Days the dish keeps
        #[arg(long, default_value = "0")]
        keeps: i64,
        /// The dish can be frozen
        #[arg(long)]
        freezable: bool,
        /// Ingredient as NAME or NAME:QTY (repeatable)
        #[arg(short, long = "ingredient", value_name = "NAME[:QTY]")]
        ingredients: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all recipes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe and its ingredients
    Show {
        /// Recipe name
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe no history entry refers to
    Delete {
        /// Recipe name
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Add a profile
    Add {
        /// Person's name
        name: String,
        /// The person is celiac
        #[arg(long)]
        celiac: bool,
        /// Ingredient the person cannot eat (repeatable)
        #[arg(short, long = "intolerant", value_name = "INGREDIENT")]
        intolerances: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all profiles
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a profile
    Delete {
        /// Person's name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Import ingredients (name,category,season_start,season_end,contains_gluten)
    Ingredients {
        /// Path to the CSV file
        file: PathBuf,
        /// Preview import without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import recipes (name,course,prep_minutes,portions,preservation_days,freezable,ingredients)
    Recipes {
        /// Path to the CSV file
        file: PathBuf,
        /// Preview import without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum StorageCommands {
    /// Set the stocked quantity of an ingredient (replaces the previous amount)
    Set {
        /// Ingredient name
        ingredient: String,
        /// Quantity in stock
        quantity: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an ingredient from storage
    Remove {
        /// Ingredient name
        ingredient: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stocked ingredients
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CompartmentCommands {
    /// Store portions of a recipe (replaces any batch already there)
    Add {
        /// Recipe name
        recipe: String,
        /// Number of portions
        portions: i64,
        /// Date the batch was stored (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Take portions out
    Take {
        /// Recipe name
        recipe: String,
        /// Number of portions
        #[arg(default_value = "1")]
        portions: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Throw a batch away
    Remove {
        /// Recipe name
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored batches, flagging those past their use-by date
    List {
        /// Date to check use-by dates against (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeekCommands {
    /// Interactively set who eats where for every slot of the week
    Plan {
        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the saved weekly plan
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Put a recipe on a slot
    Assign {
        /// Day of the week (e.g. monday or mon)
        day: String,
        /// lunch or dinner
        meal: String,
        /// Recipe name
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change where a slot is eaten
    Location {
        /// Day of the week (e.g. monday or mon)
        day: String,
        /// lunch or dinner
        meal: String,
        /// home or work
        location: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn run_compartment(
    db: &Database,
    compartment: Compartment,
    command: CompartmentCommands,
) -> Result<()> {
    match command {
        CompartmentCommands::Add {
            recipe,
            portions,
            date,
            json,
        } => cmd_compartment_add(db, compartment, &recipe, portions, date, json),
        CompartmentCommands::Take {
            recipe,
            portions,
            json,
        } => cmd_compartment_take(db, compartment, &recipe, portions, json),
        CompartmentCommands::Remove { recipe, json } => {
            cmd_compartment_remove(db, compartment, &recipe, json)
        }
        CompartmentCommands::List { date, json } => {
            cmd_compartment_list(db, compartment, date, json)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SUPPER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    tracing::debug!(db = %config.db_path.display(), "opening database");
    let service = PlannerService::from_database(Database::open(&config.db_path)?);
    let db = service.db();

    match cli.command {
        Commands::Ingredient { command } => match command {
            IngredientCommands::Add {
                name,
                category,
                season_start,
                season_end,
                gluten,
                json,
            } => cmd_ingredient_add(
                db,
                &name,
                &category,
                season_start,
                season_end,
                gluten,
                json,
            ),
            IngredientCommands::List { json } => cmd_ingredient_list(db, json),
            IngredientCommands::Delete { name, json } => cmd_ingredient_delete(db, &name, json),
        },
        Commands::Recipe { command } => match command {
            RecipeCommands::Add {
                name,
                course,
                prep,
                portions,
                keeps,
                freezable,
                ingredients,
                json,
            } => cmd_recipe_add(
                db,
                &name,
                &course,
                prep,
                portions,
                keeps,
                freezable,
                &ingredients,
                json,
            ),
            RecipeCommands::List { json } => cmd_recipe_list(db, json),
            RecipeCommands::Show { recipe, json } => cmd_recipe_show(db, &recipe, json),
            RecipeCommands::Delete { recipe, json } => cmd_recipe_delete(db, &recipe, json),
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Add {
                name,
                celiac,
                intolerances,
                json,
            } => cmd_profile_add(db, &name, celiac, intolerances, json),
            ProfileCommands::List { json } => cmd_profile_list(db, json),
            ProfileCommands::Delete { name, json } => cmd_profile_delete(db, &name, json),
        },
        Commands::History { prune: true, json, .. } => cmd_history_prune(db, json),
        Commands::History { limit, json, .. } => cmd_history(db, limit, json),
        Commands::Storage { command } => match command {
            StorageCommands::Set {
                ingredient,
                quantity,
                json,
            } => cmd_storage_set(db, &ingredient, quantity, json),
            StorageCommands::Remove { ingredient, json } => {
                cmd_storage_remove(db, &ingredient, json)
            }
            StorageCommands::List { json } => cmd_storage_list(db, json),
        },
        Commands::Fridge { command } => run_compartment(db, Compartment::Fridge, command),
        Commands::Freezer { command } => run_compartment(db, Compartment::Freezer, command),
        Commands::Week { command } => match command {
            WeekCommands::Plan { json } => cmd_week_plan(&service, json),
            WeekCommands::Show { json } => cmd_week_show(&service, json),
            WeekCommands::Assign {
                day,
                meal,
                recipe,
                json,
            } => cmd_week_assign(&service, &day, &meal, &recipe, json),
            WeekCommands::Location {
                day,
                meal,
                location,
                json,
            } => cmd_week_location(&service, &day, &meal, &location, json),
        },
        Commands::Import { command } => match command {
            ImportCommands::Ingredients {
                file,
                dry_run,
                json,
            } => cmd_import_ingredients(&service, &file, dry_run, json),
            ImportCommands::Recipes {
                file,
                dry_run,
                json,
            } => cmd_import_recipes(&service, &file, dry_run, json),
        },
        Commands::Rank { date, json } => cmd_rank(&service, date, json),
        Commands::Plan { date, slot, json } => cmd_plan(&service, date, slot, json),
    }
}
