//! The weekly plan: a lunch and a dinner slot for every day, each with the
//! people eating and whether the meal is eaten at home or carried to work.

use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};
use crate::models::Profile;
use crate::selection::{Prompter, read_roster};
use crate::store::MealStore;

/// Days in planning order.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[must_use]
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Accepts full names and the usual three-letter abbreviations.
pub fn parse_day(s: &str) -> PlanResult<Weekday> {
    s.trim().parse::<Weekday>().map_err(|_| {
        PlanError::Validation(format!("Invalid day '{s}'. Use a weekday name such as 'monday'"))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealTime {
    Lunch,
    Dinner,
}

impl MealTime {
    pub const ALL: [MealTime; 2] = [MealTime::Lunch, MealTime::Dinner];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealTime::Lunch => "lunch",
            MealTime::Dinner => "dinner",
        }
    }

    pub fn parse(s: &str) -> PlanResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "lunch" => Ok(MealTime::Lunch),
            "dinner" => Ok(MealTime::Dinner),
            _ => Err(PlanError::Validation(format!(
                "Invalid meal '{s}'. Must be 'lunch' or 'dinner'"
            ))),
        }
    }
}

impl fmt::Display for MealTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Home,
    Work,
}

impl Location {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Home => "home",
            Location::Work => "work",
        }
    }

    pub fn parse(s: &str) -> PlanResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "home" => Ok(Location::Home),
            "work" => Ok(Location::Work),
            _ => Err(PlanError::Validation(format!(
                "Invalid location '{}'. Please enter 'home' or 'work'.",
                s.trim()
            ))),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSlot {
    pub day: Weekday,
    pub meal: MealTime,
    pub location: Location,
    pub participants: Vec<String>,
    pub recipe_id: Option<i64>,
}

impl WeekSlot {
    /// "Monday lunch"
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", day_name(self.day), self.meal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WeekSetupOutcome {
    Planned { slots: Vec<WeekSlot> },
    /// The operator quit; `completed` slots had been confirmed and are discarded.
    Aborted { completed: usize },
}

/// Walk every slot of the week, asking who eats and where, and have each slot
/// confirmed before moving on. A rejected slot is asked again from the start.
pub fn run_week_setup(
    store: &dyn MealStore,
    prompter: &mut dyn Prompter,
) -> PlanResult<WeekSetupOutcome> {
    let known = store.all_profiles()?;
    let mut slots = Vec::with_capacity(WEEK.len() * MealTime::ALL.len());
    for day in WEEK {
        for meal in MealTime::ALL {
            match setup_slot(store, prompter, &known, day, meal)? {
                Some(slot) => slots.push(slot),
                None => {
                    tracing::info!(completed = slots.len(), "week setup aborted");
                    return Ok(WeekSetupOutcome::Aborted {
                        completed: slots.len(),
                    });
                }
            }
        }
    }
    Ok(WeekSetupOutcome::Planned { slots })
}

fn setup_slot(
    store: &dyn MealStore,
    prompter: &mut dyn Prompter,
    known: &[Profile],
    day: Weekday,
    meal: MealTime,
) -> PlanResult<Option<WeekSlot>> {
    let label = format!("{} {meal}", day_name(day));
    loop {
        // Without profiles there is nobody to ask about
        let participants = if known.is_empty() {
            Vec::new()
        } else {
            match read_roster(store, prompter, known, &format!("{label}. "))? {
                Some(roster) => roster.into_iter().map(|p| p.name).collect(),
                None => return Ok(None),
            }
        };

        let Some(location) = read_location(prompter, &label)? else {
            return Ok(None);
        };

        let names = if participants.is_empty() {
            "nobody".to_string()
        } else {
            participants.join(", ")
        };
        match prompter.confirm(&format!("{label}: {names} at {location}. Confirm?"))? {
            Some(true) => {
                return Ok(Some(WeekSlot {
                    day,
                    meal,
                    location,
                    participants,
                    recipe_id: None,
                }));
            }
            Some(false) => tracing::debug!(slot = %label, "slot rejected, asking again"),
            None => return Ok(None),
        }
    }
}

fn read_location(prompter: &mut dyn Prompter, label: &str) -> PlanResult<Option<Location>> {
    let mut note: Option<String> = None;
    loop {
        let prompt = format!(
            "{}Where is {label} eaten? ('home' or 'work')",
            note.take().map(|n| n + "\n").unwrap_or_default()
        );
        let Some(answer) = prompter.ask(&prompt)? else {
            return Ok(None);
        };
        match Location::parse(&answer) {
            Ok(location) => return Ok(Some(location)),
            Err(err) => note = Some(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::test_support::{Answer, ScriptedPrompter};

    fn db_with_profiles(names: &[&str]) -> Database {
        let db = Database::open_in_memory().unwrap();
        for name in names {
            db.insert_profile(&Profile {
                name: (*name).to_string(),
                celiac: false,
                intolerances: Vec::new(),
            })
            .unwrap();
        }
        db
    }

    fn quiet_slots(count: usize) -> Vec<Answer> {
        (0..count)
            .flat_map(|_| [Answer::Text("done"), Answer::Text("home"), Answer::Yes])
            .collect()
    }

    #[test]
    fn test_parse_day_and_meal() {
        assert_eq!(parse_day("monday").unwrap(), Weekday::Mon);
        assert_eq!(parse_day(" Sun ").unwrap(), Weekday::Sun);
        assert!(parse_day("someday").is_err());
        assert_eq!(MealTime::parse("DINNER").unwrap(), MealTime::Dinner);
        assert!(MealTime::parse("brunch").is_err());
        assert_eq!(Location::parse(" Work ").unwrap(), Location::Work);
    }

    #[test]
    fn test_invalid_location_is_asked_again() {
        let db = db_with_profiles(&["Ann", "Bo"]);
        let mut script = vec![
            Answer::Text("ann"),
            Answer::Text("done"),
            Answer::Text("garden"),
            Answer::Text("work"),
            Answer::Yes,
        ];
        script.extend(quiet_slots(13));
        let mut prompter = ScriptedPrompter::new(&script);

        let outcome = run_week_setup(&db, &mut prompter).unwrap();
        let WeekSetupOutcome::Planned { slots } = outcome else {
            panic!("expected a planned week, got {outcome:?}");
        };
        assert_eq!(slots.len(), 14);
        assert_eq!(slots[0].day, Weekday::Mon);
        assert_eq!(slots[0].meal, MealTime::Lunch);
        assert_eq!(slots[0].location, Location::Work);
        assert_eq!(slots[0].participants, vec!["Ann".to_string()]);
        assert_eq!(slots[13].label(), "Sunday dinner");
        assert!(prompter.prompts.iter().any(|p| {
            p.starts_with("Invalid location 'garden'. Please enter 'home' or 'work'.")
        }));
        assert!(prompter.prompts.contains(&"Monday lunch: Ann at work. Confirm?".to_string()));
    }

    #[test]
    fn test_rejected_slot_starts_over() {
        let db = db_with_profiles(&["Ann", "Bo"]);
        let mut script = vec![
            Answer::Text("Ann"),
            Answer::Text("done"),
            Answer::Text("home"),
            Answer::No,
            Answer::Text("Bo"),
            Answer::Text("done"),
            Answer::Text("home"),
            Answer::Yes,
        ];
        script.extend(quiet_slots(13));
        let mut prompter = ScriptedPrompter::new(&script);

        let WeekSetupOutcome::Planned { slots } = run_week_setup(&db, &mut prompter).unwrap()
        else {
            panic!("expected a planned week");
        };
        assert_eq!(slots[0].participants, vec!["Bo".to_string()]);
        assert!(slots[1].participants.is_empty());
    }

    #[test]
    fn test_quit_discards_the_week() {
        let db = db_with_profiles(&["Ann"]);
        let mut script = quiet_slots(2);
        script.push(Answer::Text("done"));
        script.push(Answer::Quit);
        let mut prompter = ScriptedPrompter::new(&script);

        assert_eq!(
            run_week_setup(&db, &mut prompter).unwrap(),
            WeekSetupOutcome::Aborted { completed: 2 }
        );
    }

    #[test]
    fn test_without_profiles_only_location_is_asked() {
        let db = db_with_profiles(&[]);
        let script: Vec<Answer> = (0..14)
            .flat_map(|_| [Answer::Text("work"), Answer::Yes])
            .collect();
        let mut prompter = ScriptedPrompter::new(&script);

        let WeekSetupOutcome::Planned { slots } = run_week_setup(&db, &mut prompter).unwrap()
        else {
            panic!("expected a planned week");
        };
        assert!(slots.iter().all(|s| s.location == Location::Work));
        assert!(prompter.prompts.iter().all(|p| !p.contains("participant")));
    }
}
