//! Binary acceptance classifier.
//!
//! Logistic regression over the seven feature columns, standardised and fit
//! by full-batch gradient descent on L2-regularised log-loss. Training never
//! fails: degenerate inputs produce a uniform model that scores every row 0.5.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};
use crate::features::{FEATURE_COUNT, FeatureRow};

/// Probability assigned by the fallback model.
pub const UNIFORM_PROBABILITY: f64 = 0.5;

const MIN_SCALE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Share of rows held out for diagnostics.
    pub validation_fraction: f64,
    /// Below this many labelled rows the fallback model is used.
    pub min_rows: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            validation_fraction: 0.2,
            min_rows: 5,
            epochs: 500,
            learning_rate: 0.1,
            l2: 1.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    Empty,
    TooFewRows { rows: usize, min: usize },
    SingleClass,
    Diverged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: [f64; FEATURE_COUNT],
    pub bias: f64,
    pub means: [f64; FEATURE_COUNT],
    pub scales: [f64; FEATURE_COUNT],
}

impl LogisticModel {
    fn standardize(&self, x: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for (j, v) in out.iter_mut().enumerate() {
            *v = (x[j] - self.means[j]) / self.scales[j];
        }
        out
    }

    fn logit(&self, z: &[f64; FEATURE_COUNT]) -> f64 {
        self.weights
            .iter()
            .zip(z)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.bias
    }

    #[must_use]
    pub fn probability(&self, row: &FeatureRow) -> f64 {
        sigmoid(self.logit(&self.standardize(&row.features())))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    Uniform { fallback: FallbackReason },
    Logistic(LogisticModel),
}

impl Model {
    #[must_use]
    pub fn probability(&self, row: &FeatureRow) -> f64 {
        match self {
            Model::Uniform { .. } => UNIFORM_PROBABILITY,
            Model::Logistic(model) => model.probability(row),
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Model::Uniform { .. })
    }
}

/// Rows are (actual, predicted); positive means accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    fn record(&mut self, actual: bool, predicted: bool) {
        match (actual, predicted) {
            (false, false) => self.true_negative += 1,
            (false, true) => self.false_positive += 1,
            (true, false) => self.false_negative += 1,
            (true, true) => self.true_positive += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_negative + self.true_positive) as f64 / total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub train_rows: usize,
    pub validation_rows: usize,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub model: Model,
    /// Present only for a fitted model with a non-empty validation split.
    pub diagnostics: Option<Diagnostics>,
}

impl TrainedModel {
    fn fallback(reason: FallbackReason) -> Self {
        tracing::info!(?reason, "using uniform fallback model");
        Self {
            model: Model::Uniform { fallback: reason },
            diagnostics: None,
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Labelled rows only; unlabelled rows are ignored.
fn labelled(rows: &[FeatureRow]) -> Vec<([f64; FEATURE_COUNT], bool)> {
    rows.iter()
        .filter_map(|r| r.accepted.map(|label| (r.features(), label)))
        .collect()
}

fn has_both_classes(samples: &[([f64; FEATURE_COUNT], bool)]) -> bool {
    samples.iter().any(|(_, y)| *y) && samples.iter().any(|(_, y)| !*y)
}

#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn validation_size(n: usize, fraction: f64) -> usize {
    let fraction = fraction.clamp(0.0, 1.0);
    let wanted = (n as f64 * fraction).ceil() as usize;
    wanted.min(n.saturating_sub(1))
}

/// Train a model. Never fails; see `FallbackReason` for the degenerate cases.
#[must_use]
pub fn train(rows: &[FeatureRow], config: &TrainingConfig) -> TrainedModel {
    let samples = labelled(rows);
    if samples.is_empty() {
        return TrainedModel::fallback(FallbackReason::Empty);
    }
    if samples.len() < config.min_rows {
        return TrainedModel::fallback(FallbackReason::TooFewRows {
            rows: samples.len(),
            min: config.min_rows,
        });
    }
    if !has_both_classes(&samples) {
        return TrainedModel::fallback(FallbackReason::SingleClass);
    }

    let mut order: Vec<usize> = (0..samples.len()).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    order.shuffle(&mut rng);
    let n_val = validation_size(samples.len(), config.validation_fraction);
    let (val_idx, train_idx) = order.split_at(n_val);

    let train_set: Vec<_> = train_idx.iter().map(|&i| samples[i]).collect();
    let val_set: Vec<_> = val_idx.iter().map(|&i| samples[i]).collect();

    if !has_both_classes(&train_set) {
        return TrainedModel::fallback(FallbackReason::SingleClass);
    }

    let model = match fit_logistic(&train_set, config) {
        Ok(model) => model,
        Err(e) => {
            tracing::warn!(error = %e, "training failed");
            return TrainedModel::fallback(FallbackReason::Diverged);
        }
    };

    let diagnostics = (!val_set.is_empty()).then(|| {
        let mut confusion = ConfusionMatrix::default();
        for (x, actual) in &val_set {
            let p = sigmoid(model.logit(&model.standardize(x)));
            confusion.record(*actual, p >= UNIFORM_PROBABILITY);
        }
        Diagnostics {
            train_rows: train_set.len(),
            validation_rows: val_set.len(),
            accuracy: confusion.accuracy(),
            confusion,
        }
    });

    tracing::info!(
        train_rows = train_set.len(),
        validation_rows = val_set.len(),
        accuracy = diagnostics.as_ref().map(|d| d.accuracy),
        "trained logistic model"
    );

    TrainedModel {
        model: Model::Logistic(model),
        diagnostics,
    }
}

#[allow(clippy::cast_precision_loss)]
fn fit_logistic(
    samples: &[([f64; FEATURE_COUNT], bool)],
    config: &TrainingConfig,
) -> PlanResult<LogisticModel> {
    let n = samples.len() as f64;

    let mut means = [0.0; FEATURE_COUNT];
    for (x, _) in samples {
        for j in 0..FEATURE_COUNT {
            means[j] += x[j] / n;
        }
    }
    let mut scales = [0.0; FEATURE_COUNT];
    for (x, _) in samples {
        for j in 0..FEATURE_COUNT {
            scales[j] += (x[j] - means[j]).powi(2) / n;
        }
    }
    for s in &mut scales {
        *s = if s.sqrt() < MIN_SCALE { 1.0 } else { s.sqrt() };
    }

    let mut model = LogisticModel {
        weights: [0.0; FEATURE_COUNT],
        bias: 0.0,
        means,
        scales,
    };
    let standardized: Vec<([f64; FEATURE_COUNT], f64)> = samples
        .iter()
        .map(|(x, y)| (model.standardize(x), if *y { 1.0 } else { 0.0 }))
        .collect();

    for _ in 0..config.epochs {
        let mut grad_w = [0.0; FEATURE_COUNT];
        let mut grad_b = 0.0;
        for (z, y) in &standardized {
            let err = sigmoid(model.logit(z)) - y;
            for j in 0..FEATURE_COUNT {
                grad_w[j] += err * z[j];
            }
            grad_b += err;
        }
        for j in 0..FEATURE_COUNT {
            let g = (grad_w[j] + config.l2 * model.weights[j]) / n;
            model.weights[j] -= config.learning_rate * g;
        }
        model.bias -= config.learning_rate * grad_b / n;
    }

    if model.weights.iter().all(|w| w.is_finite()) && model.bias.is_finite() {
        Ok(model)
    } else {
        Err(PlanError::Model("non-finite weights after training".to_string()))
    }
}
