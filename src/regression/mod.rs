//! Post-transfer performance regression over (metric, age, position group).

pub mod boosting;
pub mod evaluate;
mod least_squares;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SimError, SimResult, ensure_finite};
use crate::position::PositionGroup;

pub use boosting::{BoostedModel, BoostingParams};
pub use evaluate::{
    ModelReport, Outlook, PredictionSummary, SplitConfig, evaluate, mean_absolute_error, r2_score,
    train_test_split,
};
pub use least_squares::LinearModel;

/// Groups the model encodes. Defender is the reference level of the one-hot
/// encoding; goalkeepers and unmapped positions are not modelled.
pub const MODELED_GROUPS: [PositionGroup; 3] = [
    PositionGroup::Defender,
    PositionGroup::Midfielder,
    PositionGroup::Forward,
];

pub const FEATURE_COUNT: usize = 4;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["pre_metric", "age", "is_midfielder", "is_forward"];

pub type Features = [f64; FEATURE_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub pre_metric: f64,
    pub age: u32,
    pub group: PositionGroup,
    /// Label.
    pub post_metric: f64,
}

impl TrainingRow {
    pub fn features(&self) -> SimResult<Features> {
        feature_vector(self.pre_metric, self.age, self.group)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    Linear,
    Ridge,
    GradientBoosted,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::Linear,
        ModelKind::Ridge,
        ModelKind::GradientBoosted,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::Ridge => "ridge",
            ModelKind::GradientBoosted => "gradient-boosted",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModelKind {
    type Err = SimError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "linear" | "ols" => Ok(ModelKind::Linear),
            "ridge" => Ok(ModelKind::Ridge),
            "gradient-boosted" | "gbr" | "gbt" | "boosted" => Ok(ModelKind::GradientBoosted),
            other => Err(SimError::InvalidInput(format!("unknown model kind `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    pub ridge_alpha: f64,
    pub boosting: BoostingParams,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            ridge_alpha: 1.0,
            boosting: BoostingParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FittedModel {
    Linear(LinearModel),
    Ridge(LinearModel),
    GradientBoosted(BoostedModel),
}

impl FittedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            FittedModel::Linear(_) => ModelKind::Linear,
            FittedModel::Ridge(_) => ModelKind::Ridge,
            FittedModel::GradientBoosted(_) => ModelKind::GradientBoosted,
        }
    }

    pub fn train_samples(&self) -> usize {
        match self {
            FittedModel::Linear(m) | FittedModel::Ridge(m) => m.train_samples,
            FittedModel::GradientBoosted(m) => m.train_samples,
        }
    }

    pub fn predict_features(&self, x: &Features) -> f64 {
        match self {
            FittedModel::Linear(m) | FittedModel::Ridge(m) => m.predict(x),
            FittedModel::GradientBoosted(m) => m.predict(x),
        }
    }
}

pub fn fit(rows: &[TrainingRow], kind: ModelKind) -> SimResult<FittedModel> {
    fit_with(rows, kind, &FitOptions::default())
}

pub fn fit_with(rows: &[TrainingRow], kind: ModelKind, opts: &FitOptions) -> SimResult<FittedModel> {
    let (xs, ys) = design(rows)?;
    let model = match kind {
        ModelKind::Linear => FittedModel::Linear(LinearModel::fit(&xs, &ys, 0.0)?),
        ModelKind::Ridge => {
            if !opts.ridge_alpha.is_finite() || opts.ridge_alpha < 0.0 {
                return Err(SimError::InvalidInput(format!(
                    "ridge alpha must be finite and non-negative, got {}",
                    opts.ridge_alpha
                )));
            }
            FittedModel::Ridge(LinearModel::fit(&xs, &ys, opts.ridge_alpha)?)
        }
        ModelKind::GradientBoosted => {
            FittedModel::GradientBoosted(BoostedModel::fit(&xs, &ys, &opts.boosting)?)
        }
    };
    debug!(kind = %kind, rows = rows.len(), "regression fitted");
    Ok(model)
}

pub fn predict(model: &FittedModel, metric: f64, age: u32, group: PositionGroup) -> SimResult<f64> {
    let x = feature_vector(metric, age, group)?;
    Ok(model.predict_features(&x))
}

pub fn feature_vector(metric: f64, age: u32, group: PositionGroup) -> SimResult<Features> {
    ensure_finite("metric", metric)?;
    let (is_mf, is_fw) = match group {
        PositionGroup::Defender => (0.0, 0.0),
        PositionGroup::Midfielder => (1.0, 0.0),
        PositionGroup::Forward => (0.0, 1.0),
        other => {
            return Err(SimError::InvalidInput(format!(
                "position group {other} is not modelled"
            )));
        }
    };
    Ok([metric, age as f64, is_mf, is_fw])
}

/// Rows the regression can use: outfield players with finite values.
pub fn outfield_rows(rows: &[TrainingRow]) -> Vec<TrainingRow> {
    rows.iter()
        .filter(|r| r.group.is_outfield() && r.pre_metric.is_finite() && r.post_metric.is_finite())
        .copied()
        .collect()
}

fn design(rows: &[TrainingRow]) -> SimResult<(Vec<Features>, Vec<f64>)> {
    if rows.len() < FEATURE_COUNT {
        return Err(SimError::InsufficientData(format!(
            "{} rows for {} features",
            rows.len(),
            FEATURE_COUNT
        )));
    }
    for group in MODELED_GROUPS {
        if !rows.iter().any(|r| r.group == group) {
            return Err(SimError::InsufficientData(format!(
                "no training rows for position group {group}"
            )));
        }
    }

    let mut xs = Vec::with_capacity(rows.len());
    let mut ys = Vec::with_capacity(rows.len());
    for row in rows {
        ensure_finite("post_metric", row.post_metric)?;
        xs.push(row.features()?);
        ys.push(row.post_metric);
    }
    Ok((xs, ys))
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn synthetic_rows() -> Vec<TrainingRow> {
        let groups = MODELED_GROUPS;
        (0..60)
            .map(|i| {
                let group = groups[i % 3];
                let pre = 0.05 + (i as f64 * 0.37).sin().abs() * 0.8;
                let age = 19 + (i as u32 * 7) % 16;
                let bump = match group {
                    PositionGroup::Forward => 0.1,
                    PositionGroup::Midfielder => 0.05,
                    _ => 0.0,
                };
                TrainingRow {
                    pre_metric: pre,
                    age,
                    group,
                    post_metric: 0.02 + 0.7 * pre - 0.004 * (age as f64 - 26.0) + bump,
                }
            })
            .collect()
    }

    #[test]
    fn two_rows_are_insufficient() {
        let rows = &synthetic_rows()[..2];
        for kind in ModelKind::ALL {
            assert!(matches!(fit(rows, kind), Err(SimError::InsufficientData(_))));
        }
    }

    #[test]
    fn missing_group_is_insufficient() {
        let rows: Vec<TrainingRow> = synthetic_rows()
            .into_iter()
            .filter(|r| r.group != PositionGroup::Midfielder)
            .collect();
        assert!(matches!(
            fit(&rows, ModelKind::Linear),
            Err(SimError::InsufficientData(_))
        ));
    }

    #[test]
    fn goalkeeper_rows_are_rejected() {
        let mut rows = synthetic_rows();
        rows.push(TrainingRow {
            pre_metric: 0.0,
            age: 30,
            group: PositionGroup::Goalkeeper,
            post_metric: 0.0,
        });
        assert!(matches!(fit(&rows, ModelKind::Ridge), Err(SimError::InvalidInput(_))));
        assert_eq!(outfield_rows(&rows).len(), 60);
    }

    #[test]
    fn linear_recovers_exact_relationship() {
        let model = fit(&synthetic_rows(), ModelKind::Linear).unwrap();
        let p = predict(&model, 0.5, 26, PositionGroup::Forward).unwrap();
        assert!((p - (0.02 + 0.35 + 0.1)).abs() < 1e-8, "p={p}");
        let p = predict(&model, 0.3, 30, PositionGroup::Defender).unwrap();
        assert!((p - (0.02 + 0.21 - 0.016)).abs() < 1e-8, "p={p}");
    }

    #[test]
    fn refit_is_deterministic() {
        let rows = synthetic_rows();
        for kind in ModelKind::ALL {
            let a = fit(&rows, kind).unwrap();
            let b = fit(&rows, kind).unwrap();
            let pa = predict(&a, 0.42, 24, PositionGroup::Midfielder).unwrap();
            let pb = predict(&b, 0.42, 24, PositionGroup::Midfielder).unwrap();
            assert!((pa - pb).abs() < 1e-12, "{kind}: {pa} vs {pb}");
            assert_eq!(a.kind(), kind);
            assert_eq!(a.train_samples(), rows.len());
        }
    }

    #[test]
    fn predict_rejects_unmodelled_inputs() {
        let model = fit(&synthetic_rows(), ModelKind::Ridge).unwrap();
        assert!(predict(&model, 0.4, 25, PositionGroup::Goalkeeper).is_err());
        assert!(predict(&model, f64::NAN, 25, PositionGroup::Forward).is_err());
    }

    #[test]
    fn model_kind_parses() {
        assert_eq!("Ridge".parse::<ModelKind>(), Ok(ModelKind::Ridge));
        assert_eq!("gradient_boosted".parse::<ModelKind>(), Ok(ModelKind::GradientBoosted));
        assert!("forest".parse::<ModelKind>().is_err());
    }
}
