//! Interactive meal selection.
//!
//! A small state machine walks the operator through confirming who is eating,
//! then offers ranked main candidates and, for a "main dish", ranked sides.
//! Every accept or reject is written back through `MealStore::record_decision`
//! as soon as it is made.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::PlanResult;
use crate::models::{CourseType, Decision, MealHistoryEntry, Profile, Recipe};
use crate::ranking::{Candidates, DietaryConstraints, Prediction, filter_and_partition};
use crate::store::MealStore;

/// Input that ends participant collection.
pub const DONE_SENTINEL: &str = "done";

/// Rounds of participant collection (an empty roster or a rejected roster
/// each use one) before the run gives up.
pub const MAX_ROSTER_ATTEMPTS: usize = 3;

/// The interaction surface. Returning `None` from either method aborts the
/// run; decisions already written back stay written.
pub trait Prompter {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>>;
    fn confirm(&mut self, prompt: &str) -> Result<Option<bool>>;
}

pub struct SelectionContext<'a> {
    pub store: &'a dyn MealStore,
    pub catalog: &'a Catalog,
    /// Predictions in rank order.
    pub ranked: &'a [Prediction],
    pub today: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealSelection {
    pub participants: Vec<Profile>,
    pub main: Recipe,
    pub sides: Vec<Recipe>,
    /// Every decision written back during the run, in order.
    pub decisions: Vec<MealHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SelectionOutcome {
    Selected(MealSelection),
    /// Every main candidate was rejected (or none survived the filter).
    NoSuitableMeal {
        participants: Vec<Profile>,
        decisions: Vec<MealHistoryEntry>,
    },
    NoParticipants { attempts: usize },
    Aborted { decisions: Vec<MealHistoryEntry> },
}

enum State {
    CollectingParticipants {
        attempt: usize,
    },
    ConfirmParticipants {
        attempt: usize,
        roster: Vec<Profile>,
    },
    SelectingMain {
        participants: Vec<Profile>,
        candidates: Candidates,
    },
    SelectingSides {
        participants: Vec<Profile>,
        main: Recipe,
        sides: Vec<Recipe>,
    },
    Done {
        participants: Vec<Profile>,
        main: Recipe,
        sides: Vec<Recipe>,
    },
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::CollectingParticipants { .. } => "collecting_participants",
            State::ConfirmParticipants { .. } => "confirm_participants",
            State::SelectingMain { .. } => "selecting_main",
            State::SelectingSides { .. } => "selecting_sides",
            State::Done { .. } => "done",
        }
    }
}

enum Step {
    Next(State),
    Finish(SelectionOutcome),
}

struct SelectionRun<'c, 'a> {
    ctx: &'c SelectionContext<'a>,
    prompter: &'c mut dyn Prompter,
    decisions: Vec<MealHistoryEntry>,
}

/// Read participant names until `DONE_SENTINEL`, accepting only names of
/// `known` profiles. Returns `None` when the operator aborts. The roster may
/// be empty.
pub(crate) fn read_roster(
    store: &dyn MealStore,
    prompter: &mut dyn Prompter,
    known: &[Profile],
    heading: &str,
) -> PlanResult<Option<Vec<Profile>>> {
    let known_names = known
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut roster: Vec<Profile> = Vec::new();
    let mut note: Option<String> = None;
    loop {
        let prompt = format!(
            "{}{heading}Profiles: {known_names}. Enter a participant name or '{DONE_SENTINEL}' to finish",
            note.take().map(|n| n + "\n").unwrap_or_default()
        );
        let Some(answer) = prompter.ask(&prompt)? else {
            return Ok(None);
        };
        let name = answer.trim();
        if name.is_empty() {
            continue;
        }
        if name.eq_ignore_ascii_case(DONE_SENTINEL) {
            return Ok(Some(roster));
        }
        match store.profile_by_name(name)? {
            Some(profile) => {
                if roster.iter().any(|p| p.name.eq_ignore_ascii_case(&profile.name)) {
                    note = Some(format!("{} is already taking part.", profile.name));
                } else {
                    roster.push(profile);
                }
            }
            None => note = Some(format!("Unknown participant '{name}'. Please try again.")),
        }
    }
}

/// Drive one selection from participant collection to a final outcome.
pub fn run_selection(
    ctx: &SelectionContext<'_>,
    prompter: &mut dyn Prompter,
) -> PlanResult<SelectionOutcome> {
    let mut run = SelectionRun {
        ctx,
        prompter,
        decisions: Vec::new(),
    };
    let mut state = State::CollectingParticipants { attempt: 1 };
    loop {
        tracing::debug!(state = state.name(), "selection state");
        let step = match state {
            State::CollectingParticipants { attempt } => run.collect_participants(attempt)?,
            State::ConfirmParticipants { attempt, roster } => {
                run.confirm_participants(attempt, roster)?
            }
            State::SelectingMain {
                participants,
                candidates,
            } => run.select_main(participants, candidates)?,
            State::SelectingSides {
                participants,
                main,
                sides,
            } => run.select_sides(participants, main, sides)?,
            State::Done {
                participants,
                main,
                sides,
            } => Step::Finish(SelectionOutcome::Selected(MealSelection {
                participants,
                main,
                sides,
                decisions: std::mem::take(&mut run.decisions),
            })),
        };
        match step {
            Step::Next(next) => state = next,
            Step::Finish(outcome) => return Ok(outcome),
        }
    }
}

impl SelectionRun<'_, '_> {
    fn aborted(&mut self) -> Step {
        tracing::info!(decisions = self.decisions.len(), "selection aborted");
        Step::Finish(SelectionOutcome::Aborted {
            decisions: std::mem::take(&mut self.decisions),
        })
    }

    fn write_back(&mut self, recipe: &Recipe, accepted: bool) -> Result<()> {
        let decision = Decision {
            recipe_id: recipe.id,
            date: self.ctx.today,
            in_season: self.ctx.catalog.in_season(recipe.id, self.ctx.today.month()),
            accepted,
        };
        let entry = self.ctx.store.record_decision(&decision)?;
        self.decisions.push(entry);
        Ok(())
    }

    fn collect_participants(&mut self, attempt: usize) -> PlanResult<Step> {
        if attempt > MAX_ROSTER_ATTEMPTS {
            return Ok(Step::Finish(SelectionOutcome::NoParticipants {
                attempts: MAX_ROSTER_ATTEMPTS,
            }));
        }

        let known = self.ctx.store.all_profiles()?;
        if known.is_empty() {
            return Ok(Step::Finish(SelectionOutcome::NoParticipants { attempts: 0 }));
        }
        let Some(roster) = read_roster(self.ctx.store, &mut *self.prompter, &known, "")? else {
            return Ok(self.aborted());
        };

        if roster.is_empty() {
            tracing::debug!(attempt, "empty roster");
            return Ok(Step::Next(State::CollectingParticipants {
                attempt: attempt + 1,
            }));
        }
        Ok(Step::Next(State::ConfirmParticipants { attempt, roster }))
    }

    fn confirm_participants(&mut self, attempt: usize, roster: Vec<Profile>) -> PlanResult<Step> {
        let names = roster
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let Some(confirmed) = self
            .prompter
            .confirm(&format!("Participants: {names}. Confirm?"))?
        else {
            return Ok(self.aborted());
        };
        if !confirmed {
            return Ok(Step::Next(State::CollectingParticipants {
                attempt: attempt + 1,
            }));
        }

        let constraints = DietaryConstraints::for_participants(&roster);
        let candidates = filter_and_partition(self.ctx.ranked, self.ctx.catalog, &constraints);
        tracing::debug!(
            gluten_free = constraints.gluten_free,
            excluded = constraints.excluded_ingredients.len(),
            mains = candidates.mains.len(),
            sides = candidates.sides.len(),
            "filtered candidates"
        );
        Ok(Step::Next(State::SelectingMain {
            participants: roster,
            candidates,
        }))
    }

    fn select_main(
        &mut self,
        participants: Vec<Profile>,
        candidates: Candidates,
    ) -> PlanResult<Step> {
        for recipe in candidates.mains {
            let Some(accepted) = self.prompter.confirm(&format!(
                "Suggested main: {} ({}). Accept?",
                recipe.name, recipe.course
            ))?
            else {
                return Ok(self.aborted());
            };
            self.write_back(&recipe, accepted)?;
            if !accepted {
                continue;
            }
            let next = if recipe.course == CourseType::Main {
                State::SelectingSides {
                    participants,
                    main: recipe,
                    sides: candidates.sides,
                }
            } else {
                State::Done {
                    participants,
                    main: recipe,
                    sides: Vec::new(),
                }
            };
            return Ok(Step::Next(next));
        }

        tracing::info!(
            decisions = self.decisions.len(),
            "no main candidate accepted"
        );
        Ok(Step::Finish(SelectionOutcome::NoSuitableMeal {
            participants,
            decisions: std::mem::take(&mut self.decisions),
        }))
    }

    fn select_sides(
        &mut self,
        participants: Vec<Profile>,
        main: Recipe,
        sides: Vec<Recipe>,
    ) -> PlanResult<Step> {
        let mut chosen = Vec::new();
        if !sides.is_empty() {
            let Some(wanted) = self.prompter.confirm("Would you like side dishes?")? else {
                return Ok(self.aborted());
            };
            if wanted {
                for side in sides {
                    let Some(accepted) = self
                        .prompter
                        .confirm(&format!("Suggested side: {}. Accept?", side.name))?
                    else {
                        return Ok(self.aborted());
                    };
                    self.write_back(&side, accepted)?;
                    if accepted {
                        chosen.push(side);
                        continue;
                    }
                    let Some(more) = self.prompter.confirm("Look for another side?")? else {
                        return Ok(self.aborted());
                    };
                    if !more {
                        break;
                    }
                }
            }
        }
        Ok(Step::Next(State::Done {
            participants,
            main,
            sides: chosen,
        }))
    }
}
