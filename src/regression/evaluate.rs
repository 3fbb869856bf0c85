use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{FitOptions, FittedModel, ModelKind, TrainingRow, fit_with};
use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub kind: ModelKind,
    pub r2: f64,
    pub mae: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    /// (actual, predicted) over the held-out rows.
    pub holdout: Vec<(f64, f64)>,
    /// Model fitted on the training split.
    #[serde(skip)]
    pub model: FittedModel,
}

/// Shuffle with a seeded RNG and hold out `ceil(n * test_fraction)` rows.
pub fn train_test_split(
    rows: &[TrainingRow],
    split: &SplitConfig,
) -> SimResult<(Vec<TrainingRow>, Vec<TrainingRow>)> {
    if !(split.test_fraction > 0.0 && split.test_fraction < 1.0) {
        return Err(SimError::InvalidInput(format!(
            "test_fraction must be in (0, 1), got {}",
            split.test_fraction
        )));
    }
    let n = rows.len();
    let n_test = (n as f64 * split.test_fraction).ceil() as usize;
    if n < 2 || n_test >= n {
        return Err(SimError::InsufficientData(format!(
            "{n} rows cannot be split with test_fraction {}",
            split.test_fraction
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(split.seed));
    let test = order[..n_test].iter().map(|&i| rows[i]).collect();
    let train = order[n_test..].iter().map(|&i| rows[i]).collect();
    Ok((train, test))
}

pub fn evaluate(
    rows: &[TrainingRow],
    kind: ModelKind,
    opts: &FitOptions,
    split: &SplitConfig,
) -> SimResult<ModelReport> {
    let (train, test) = train_test_split(rows, split)?;
    let model = fit_with(&train, kind, opts)?;

    let mut holdout = Vec::with_capacity(test.len());
    for row in &test {
        holdout.push((row.post_metric, model.predict_features(&row.features()?)));
    }
    let actual: Vec<f64> = holdout.iter().map(|(a, _)| *a).collect();
    let predicted: Vec<f64> = holdout.iter().map(|(_, p)| *p).collect();

    Ok(ModelReport {
        kind,
        r2: r2_score(&actual, &predicted),
        mae: mean_absolute_error(&actual, &predicted),
        train_samples: train.len(),
        test_samples: test.len(),
        holdout,
        model,
    })
}

/// Coefficient of determination. A constant target scores 1 when predicted
/// exactly and 0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for i in 0..n {
        ss_res += (actual[i] - predicted[i]).powi(2);
        ss_tot += (actual[i] - mean).powi(2);
    }
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outlook {
    Drop,
    Similar,
    Improve,
}

/// What a single prediction means for the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub input_metric: f64,
    /// Prediction floored at zero.
    pub predicted_metric: f64,
    pub expected_minutes: f64,
    pub predicted_total: u32,
    pub change_pct: f64,
    pub outlook: Outlook,
}

impl PredictionSummary {
    const OUTLOOK_BAND_PCT: f64 = 10.0;

    pub fn new(input_metric: f64, raw_prediction: f64, expected_minutes: f64) -> Self {
        let predicted_metric = raw_prediction.max(0.0);
        let predicted_total = (predicted_metric * expected_minutes.max(0.0) / 90.0).floor() as u32;
        let change_pct = if input_metric > 0.0 {
            (predicted_metric - input_metric) / input_metric * 100.0
        } else {
            0.0
        };
        let outlook = if change_pct < -Self::OUTLOOK_BAND_PCT {
            Outlook::Drop
        } else if change_pct > Self::OUTLOOK_BAND_PCT {
            Outlook::Improve
        } else {
            Outlook::Similar
        };
        Self {
            input_metric,
            predicted_metric,
            expected_minutes,
            predicted_total,
            change_pct,
            outlook,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::tests::synthetic_rows;

    #[test]
    fn split_sizes_and_determinism() {
        let rows = synthetic_rows();
        let split = SplitConfig::default();
        let (train, test) = train_test_split(&rows, &split).unwrap();
        assert_eq!(test.len(), 12);
        assert_eq!(train.len(), 48);
        let (train2, test2) = train_test_split(&rows, &split).unwrap();
        assert_eq!(train, train2);
        assert_eq!(test, test2);
    }

    #[test]
    fn split_rejects_bad_fraction() {
        let rows = synthetic_rows();
        let split = SplitConfig {
            test_fraction: 1.0,
            ..Default::default()
        };
        assert!(train_test_split(&rows, &split).is_err());
    }

    #[test]
    fn linear_scores_well_on_linear_data() {
        let report = evaluate(
            &synthetic_rows(),
            ModelKind::Linear,
            &FitOptions::default(),
            &SplitConfig::default(),
        )
        .unwrap();
        assert!(report.r2 > 0.999, "r2={}", report.r2);
        assert!(report.mae < 1e-6);
        assert_eq!(report.holdout.len(), report.test_samples);
        assert_eq!(report.model.train_samples(), report.train_samples);
        let (_, test) = train_test_split(&synthetic_rows(), &SplitConfig::default()).unwrap();
        let first = report.model.predict_features(&test[0].features().unwrap());
        assert_eq!(first, report.holdout[0].1);
    }

    #[test]
    fn metrics_basics() {
        assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[1.0, 2.0]), 0.0);
        assert!((mean_absolute_error(&[1.0, 2.0], &[2.0, 4.0]) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn summary_outlook_bands() {
        let s = PredictionSummary::new(0.5, 0.4, 2000.0);
        assert_eq!(s.outlook, Outlook::Drop);
        assert_eq!(s.predicted_total, 8);
        assert_eq!(PredictionSummary::new(0.5, 0.52, 2000.0).outlook, Outlook::Similar);
        assert_eq!(PredictionSummary::new(0.5, 0.6, 2000.0).outlook, Outlook::Improve);
        let neg = PredictionSummary::new(0.0, -0.1, 900.0);
        assert_eq!(neg.predicted_metric, 0.0);
        assert_eq!(neg.change_pct, 0.0);
        assert_eq!(neg.outlook, Outlook::Similar);
    }
}
