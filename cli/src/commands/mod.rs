mod helpers;
mod history;
mod import;
mod ingredient;
mod inventory;
mod plan;
mod profile;
mod rank;
mod recipe;
mod week;

pub(crate) use history::{cmd_history, cmd_history_prune};
pub(crate) use import::{cmd_import_ingredients, cmd_import_recipes};
pub(crate) use ingredient::{cmd_ingredient_add, cmd_ingredient_delete, cmd_ingredient_list};
pub(crate) use inventory::{
    cmd_compartment_add, cmd_compartment_list, cmd_compartment_remove, cmd_compartment_take,
    cmd_storage_list, cmd_storage_remove, cmd_storage_set,
};
pub(crate) use plan::cmd_plan;
pub(crate) use profile::{cmd_profile_add, cmd_profile_delete, cmd_profile_list};
pub(crate) use rank::cmd_rank;
pub(crate) use recipe::{cmd_recipe_add, cmd_recipe_delete, cmd_recipe_list, cmd_recipe_show};
pub(crate) use week::{cmd_week_assign, cmd_week_location, cmd_week_plan, cmd_week_show};
