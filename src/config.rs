use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::position::PositionGroup;

pub const CONFIG_PATH_ENV: &str = "TRANSFER_LAB_CONFIG";
pub const PLAYERS_CSV_ENV: &str = "TRANSFER_LAB_PLAYERS_CSV";
pub const RATINGS_CSV_ENV: &str = "TRANSFER_LAB_RATINGS_CSV";
pub const TRAINING_CSV_ENV: &str = "TRANSFER_LAB_TRAINING_CSV";
pub const SEASON_ENV: &str = "TRANSFER_LAB_SEASON";

pub const DEFAULT_SEASON: &str = "2025-26";
pub const DEFAULT_RATING: f64 = 50.0;

/// Tunables for the rating-ratio projector and the rating tables it reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Floor substituted for a zero or near-zero origin rating.
    pub epsilon: f64,
    pub min_ratio: f64,
    pub max_ratio: f64,
    pub coefficients: BTreeMap<PositionGroup, f64>,
    pub default_rating: f64,
    pub rating_min: f64,
    pub rating_max: f64,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            min_ratio: 0.0,
            max_ratio: 3.0,
            coefficients: PositionGroup::ALL.into_iter().map(|g| (g, 1.0)).collect(),
            default_rating: DEFAULT_RATING,
            rating_min: 0.0,
            rating_max: 100.0,
        }
    }
}

impl ProjectorConfig {
    pub fn coefficient(&self, group: PositionGroup) -> Option<f64> {
        self.coefficients.get(&group).copied()
    }

    pub fn with_coefficient(mut self, group: PositionGroup, value: f64) -> Self {
        self.coefficients.insert(group, value);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("epsilon", self.epsilon),
            ("min_ratio", self.min_ratio),
            ("max_ratio", self.max_ratio),
            ("default_rating", self.default_rating),
            ("rating_min", self.rating_min),
            ("rating_max", self.rating_max),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                bail!("{name} must be finite, got {value}");
            }
        }
        if self.epsilon <= 0.0 {
            bail!("epsilon must be positive, got {}", self.epsilon);
        }
        if self.min_ratio < 0.0 || self.min_ratio > self.max_ratio {
            bail!(
                "ratio bounds must satisfy 0 <= min_ratio <= max_ratio, got [{}, {}]",
                self.min_ratio,
                self.max_ratio
            );
        }
        if self.rating_min > self.rating_max {
            bail!(
                "rating bounds are inverted: [{}, {}]",
                self.rating_min,
                self.rating_max
            );
        }
        if !(self.rating_min..=self.rating_max).contains(&self.default_rating) {
            bail!(
                "default_rating {} is outside [{}, {}]",
                self.default_rating,
                self.rating_min,
                self.rating_max
            );
        }
        for (group, coef) in &self.coefficients {
            if !coef.is_finite() || *coef < 0.0 {
                bail!("coefficient for {group} must be finite and non-negative, got {coef}");
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read projector config {}", path.display()))?;
        let cfg = serde_json::from_str::<ProjectorConfig>(&raw)
            .with_context(|| format!("parse projector config {}", path.display()))?;
        cfg.validate()
            .with_context(|| format!("validate projector config {}", path.display()))?;
        Ok(cfg)
    }

    /// Config file named by `TRANSFER_LAB_CONFIG`, or the defaults.
    pub fn from_env() -> Result<Self> {
        match path_from_env(CONFIG_PATH_ENV) {
            Some(path) => {
                info!(path = %path.display(), "loading projector config");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }
}

/// Tunables for the team + league scaling rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// 1.0 linear, 2.0 squared, 3.0 cubed.
    pub rating_sensitivity: f64,
    /// Exponent on position-group average ratios.
    pub position_weight: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            rating_sensitivity: 2.0,
            position_weight: 0.4,
            min_multiplier: 0.3,
            max_multiplier: 3.0,
        }
    }
}

/// Reference data locations resolved from the environment.
#[derive(Debug, Clone, Default)]
pub struct AppPaths {
    pub players_csv: Option<PathBuf>,
    pub ratings_csv: Option<PathBuf>,
    pub training_csv: Option<PathBuf>,
    pub season: String,
}

impl AppPaths {
    pub fn from_env() -> Self {
        Self {
            players_csv: path_from_env(PLAYERS_CSV_ENV),
            ratings_csv: path_from_env(RATINGS_CSV_ENV),
            training_csv: path_from_env(TRAINING_CSV_ENV),
            season: env::var(SEASON_ENV)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SEASON.to_string()),
        }
    }
}

fn path_from_env(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ProjectorConfig::default().validate().unwrap();
        assert_eq!(ProjectorConfig::default().coefficient(PositionGroup::Forward), Some(1.0));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: ProjectorConfig =
            serde_json::from_str(r#"{"max_ratio": 2.0, "coefficients": {"Forward": 1.1}}"#).unwrap();
        assert_eq!(cfg.max_ratio, 2.0);
        assert_eq!(cfg.default_rating, DEFAULT_RATING);
        assert_eq!(cfg.coefficient(PositionGroup::Forward), Some(1.1));
        assert_eq!(cfg.coefficient(PositionGroup::Defender), None);
    }

    #[test]
    fn rejects_inverted_ratio_bounds() {
        let cfg = ProjectorConfig {
            min_ratio: 2.0,
            max_ratio: 1.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_negative_coefficient() {
        let cfg = ProjectorConfig::default().with_coefficient(PositionGroup::Midfielder, -0.5);
        assert!(cfg.validate().is_err());
    }
}
