use thiserror::Error;

/// Typed failures of the recommendation engine.
///
/// Store and I/O plumbing stays on `anyhow`; these are the conditions callers
/// are expected to tell apart.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Operator or catalog input that fails validation.
    #[error("{0}")]
    Validation(String),

    /// The history log references a recipe missing from the catalog. Recipes
    /// in use cannot be deleted, so only an externally edited store gets here;
    /// `Database::prune_orphan_history` repairs it.
    #[error(
        "history entry {history_id} references recipe {recipe_id}, which is not in the catalog"
    )]
    UnknownRecipe { history_id: i64, recipe_id: i64 },

    /// Training produced an unusable model. `classifier::train` turns this
    /// into the uniform fallback.
    #[error("model error: {0}")]
    Model(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type PlanResult<T> = Result<T, PlanError>;
