use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use supper_core::db::Database;
use supper_core::models::Profile;

use super::helpers::{exit_not_found, yes_no};

pub(crate) fn cmd_profile_add(
    db: &Database,
    name: &str,
    celiac: bool,
    intolerances: Vec<String>,
    json: bool,
) -> Result<()> {
    let profile = db.insert_profile(&Profile {
        name: name.to_string(),
        celiac,
        intolerances,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Added profile {}", profile.name);
        if profile.celiac {
            println!("  Celiac: gluten will be excluded when {} is eating", profile.name);
        }
        if !profile.intolerances.is_empty() {
            println!("  Avoids: {}", profile.intolerances.join(", "));
        }
    }
    Ok(())
}

pub(crate) fn cmd_profile_list(db: &Database, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct ProfileRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Celiac")]
        celiac: &'static str,
        #[tabled(rename = "Intolerances")]
        intolerances: String,
    }

    let profiles = db.get_all_profiles()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }
    if profiles.is_empty() {
        eprintln!("No profiles yet. Use `supper profile add <name>`.");
        return Ok(());
    }

    let rows: Vec<ProfileRow> = profiles
        .iter()
        .map(|p| ProfileRow {
            name: p.name.clone(),
            celiac: yes_no(p.celiac),
            intolerances: if p.intolerances.is_empty() {
                "-".to_string()
            } else {
                p.intolerances.join(", ")
            },
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_profile_delete(db: &Database, name: &str, json: bool) -> Result<()> {
    if !db.delete_profile(name)? {
        exit_not_found(&format!("Profile '{name}' not found"), json);
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": name }));
    } else {
        println!("Deleted profile {name}");
    }
    Ok(())
}
