use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::classifier::Model;
use crate::features::ScoringRow;
use crate::models::{Profile, Recipe};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub recipe_id: i64,
    pub probability: f64,
}

#[must_use]
pub fn score_candidates(model: &Model, rows: &[ScoringRow]) -> Vec<Prediction> {
    rows.iter()
        .map(|r| Prediction {
            recipe_id: r.recipe_id,
            probability: model.probability(&r.row),
        })
        .collect()
}

/// Highest probability first; equal probabilities by ascending recipe id.
#[must_use]
pub fn rank(mut predictions: Vec<Prediction>) -> Vec<Prediction> {
    predictions.sort_by(|a, b| match b.probability.total_cmp(&a.probability) {
        Ordering::Equal => a.recipe_id.cmp(&b.recipe_id),
        other => other,
    });
    predictions
}

/// Restrictions derived from the confirmed participants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DietaryConstraints {
    pub gluten_free: bool,
    /// Lowercased ingredient names nobody at the table can eat.
    pub excluded_ingredients: BTreeSet<String>,
}

impl DietaryConstraints {
    #[must_use]
    pub fn for_participants(participants: &[Profile]) -> Self {
        Self {
            gluten_free: participants.iter().any(|p| p.celiac),
            excluded_ingredients: participants
                .iter()
                .flat_map(|p| p.intolerances.iter())
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Whether `recipe_id` may be served under these constraints.
    #[must_use]
    pub fn allows(&self, catalog: &Catalog, recipe_id: i64) -> bool {
        if self.gluten_free && catalog.contains_gluten(recipe_id) {
            return false;
        }
        !catalog.ingredients(recipe_id).iter().any(|i| {
            self.excluded_ingredients
                .contains(&i.ingredient_name.to_lowercase())
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Candidates {
    pub mains: Vec<Recipe>,
    pub sides: Vec<Recipe>,
}

/// Drop recipes the constraints forbid, then split the survivors into main
/// and side candidates. Both partitions keep the rank order of `ranked`.
#[must_use]
pub fn filter_and_partition(
    ranked: &[Prediction],
    catalog: &Catalog,
    constraints: &DietaryConstraints,
) -> Candidates {
    let allowed: Vec<&Recipe> = ranked
        .iter()
        .filter_map(|p| catalog.get(p.recipe_id))
        .filter(|recipe| constraints.allows(catalog, recipe.id))
        .collect();

    let (mains, sides): (Vec<&Recipe>, Vec<&Recipe>) =
        allowed.into_iter().partition(|r| r.course.is_main_candidate());

    Candidates {
        mains: mains.into_iter().cloned().collect(),
        sides: sides.into_iter().cloned().collect(),
    }
}
