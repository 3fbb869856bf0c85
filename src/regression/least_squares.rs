use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use super::{FEATURE_COUNT, Features};
use crate::error::{SimError, SimResult};

/// Smallest Cholesky diagonal accepted on the unit-variance gram matrix.
const MIN_PIVOT: f64 = 1e-7;

/// Linear model on standardised features. With `l2 = 0` this is ordinary
/// least squares; the intercept is never penalised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearModel {
    pub feature_means: Features,
    pub feature_stds: Features,
    pub coeffs: Features,
    pub intercept: f64,
    pub l2: f64,
    pub train_samples: usize,
}

impl LinearModel {
    pub fn fit(xs: &[Features], ys: &[f64], l2: f64) -> SimResult<Self> {
        let n = xs.len();
        if n == 0 || n != ys.len() {
            return Err(SimError::InsufficientData(format!(
                "{} feature rows for {} labels",
                n,
                ys.len()
            )));
        }
        let nf = n as f64;
        let (means, stds) = feature_norm_stats(xs);
        let y_mean = ys.iter().sum::<f64>() / nf;

        let design = DMatrix::from_fn(n, FEATURE_COUNT, |r, c| {
            (xs[r][c] - means[c]) / stds[c]
        });
        let centred = DVector::from_iterator(n, ys.iter().map(|y| y - y_mean));
        let gram = design.tr_mul(&design) / nf
            + DMatrix::<f64>::identity(FEATURE_COUNT, FEATURE_COUNT) * (l2 / nf);
        let rhs = design.tr_mul(&centred) / nf;

        let chol = gram
            .cholesky()
            .filter(|c| c.l_dirty().diagonal().iter().all(|d| *d > MIN_PIVOT))
            .ok_or_else(|| SimError::InsufficientData("design matrix is singular".to_string()))?;
        let solution = chol.solve(&rhs);
        let mut coeffs = [0.0; FEATURE_COUNT];
        coeffs.copy_from_slice(solution.as_slice());

        Ok(Self {
            feature_means: means,
            feature_stds: stds,
            coeffs,
            intercept: y_mean,
            l2,
            train_samples: n,
        })
    }

    pub fn predict(&self, x: &Features) -> f64 {
        let z = standardize(x, &self.feature_means, &self.feature_stds);
        self.intercept + dot(&self.coeffs, &z)
    }

    /// Coefficients on the original feature scale, plus the matching intercept.
    pub fn raw_coefficients(&self) -> (Features, f64) {
        let mut raw = [0.0; FEATURE_COUNT];
        let mut intercept = self.intercept;
        for i in 0..FEATURE_COUNT {
            raw[i] = self.coeffs[i] / self.feature_stds[i];
            intercept -= raw[i] * self.feature_means[i];
        }
        (raw, intercept)
    }
}

/// Population mean and std per feature. A constant column gets std 1 so it
/// standardises to zeros.
fn feature_norm_stats(xs: &[Features]) -> (Features, Features) {
    let n = xs.len().max(1) as f64;
    let mut mean = [0.0; FEATURE_COUNT];
    let mut std = [0.0; FEATURE_COUNT];
    for x in xs {
        for i in 0..FEATURE_COUNT {
            mean[i] += x[i] / n;
        }
    }
    for x in xs {
        for i in 0..FEATURE_COUNT {
            let d = x[i] - mean[i];
            std[i] += d * d / n;
        }
    }
    for v in &mut std {
        *v = v.sqrt();
        if *v < 1e-12 {
            *v = 1.0;
        }
    }
    (mean, std)
}

fn standardize(x: &Features, mean: &Features, std: &Features) -> Features {
    let mut z = [0.0; FEATURE_COUNT];
    for i in 0..FEATURE_COUNT {
        z[i] = (x[i] - mean[i]) / std[i];
    }
    z
}

fn dot(a: &Features, b: &Features) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_column_is_singular_without_penalty() {
        let xs: Vec<Features> = (0..10)
            .map(|i| [i as f64, 25.0, (i % 2) as f64, 0.0])
            .collect();
        let ys: Vec<f64> = (0..10).map(|i| i as f64 * 0.1).collect();
        assert!(LinearModel::fit(&xs, &ys, 0.0).is_err());
        let ridge = LinearModel::fit(&xs, &ys, 1.0).unwrap();
        assert!(ridge.predict(&xs[3]).is_finite());
    }

    #[test]
    fn duplicated_column_is_singular_without_penalty() {
        let xs: Vec<Features> = (0..12)
            .map(|i| {
                let m = i as f64 * 0.07;
                [m, m, (i % 3 == 1) as u8 as f64, (i % 3 == 2) as u8 as f64]
            })
            .collect();
        let ys: Vec<f64> = xs.iter().map(|x| 0.2 + 0.5 * x[0]).collect();
        let err = LinearModel::fit(&xs, &ys, 0.0).unwrap_err();
        assert_eq!(err, SimError::InsufficientData("design matrix is singular".into()));
        let ridge = LinearModel::fit(&xs, &ys, 0.5).unwrap();
        assert!((ridge.coeffs[0] - ridge.coeffs[1]).abs() < 1e-9);
    }

    #[test]
    fn ridge_shrinks_toward_mean() {
        let xs: Vec<Features> = (0..20)
            .map(|i| {
                let is_mf = if i % 3 == 1 { 1.0 } else { 0.0 };
                let is_fw = if i % 3 == 2 { 1.0 } else { 0.0 };
                [i as f64 * 0.05, 20.0 + (i % 7) as f64, is_mf, is_fw]
            })
            .collect();
        let ys: Vec<f64> = xs.iter().map(|x| 0.1 + 0.8 * x[0]).collect();
        let ols = LinearModel::fit(&xs, &ys, 0.0).unwrap();
        let ridge = LinearModel::fit(&xs, &ys, 50.0).unwrap();
        assert!(ridge.coeffs[0].abs() < ols.coeffs[0].abs());
        let (raw, intercept) = ols.raw_coefficients();
        assert!((raw[0] - 0.8).abs() < 1e-8);
        assert!((intercept - 0.1).abs() < 1e-8);
    }
}
