use serde::Serialize;

use crate::config::ProjectorConfig;
use crate::error::{SimError, SimResult, ensure_finite};
use crate::position::PositionGroup;
use crate::ratings::RatingTable;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionResult {
    pub current: f64,
    pub projected: f64,
    pub delta: f64,
    /// Zero when the current value is zero.
    pub delta_pct: f64,
}

impl ProjectionResult {
    pub fn new(current: f64, projected: f64) -> Self {
        let delta = projected - current;
        let delta_pct = if current != 0.0 {
            delta / current * 100.0
        } else {
            0.0
        };
        Self {
            current,
            projected,
            delta,
            delta_pct,
        }
    }
}

/// A player move resolved against the rating tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferScenario {
    pub player: String,
    pub group: PositionGroup,
    pub current_metric: f64,
    pub origin: String,
    pub origin_rating: f64,
    pub destination: String,
    pub destination_rating: f64,
}

impl TransferScenario {
    pub fn resolve(
        player: &str,
        raw_position: &str,
        current_metric: f64,
        origin: &str,
        destination: &str,
        ratings: &RatingTable,
    ) -> Self {
        Self {
            player: player.to_string(),
            group: crate::position::map_position(raw_position),
            current_metric,
            origin: origin.to_string(),
            origin_rating: ratings.get_rating(origin),
            destination: destination.to_string(),
            destination_rating: ratings.get_rating(destination),
        }
    }

    pub fn project(&self, cfg: &ProjectorConfig) -> SimResult<ProjectionResult> {
        projection_result(
            self.current_metric,
            self.origin_rating,
            self.destination_rating,
            self.group,
            cfg,
        )
    }
}

/// Scale `current_metric` by the destination/origin rating ratio and the
/// group's coefficient.
///
/// The ratio uses `max(origin, epsilon)` as denominator and is clamped to
/// `[min_ratio, max_ratio]`; the output is never negative.
pub fn project(
    current_metric: f64,
    origin_rating: f64,
    destination_rating: f64,
    group: PositionGroup,
    cfg: &ProjectorConfig,
) -> SimResult<f64> {
    ensure_finite("current_metric", current_metric)?;
    ensure_finite("origin_rating", origin_rating)?;
    ensure_finite("destination_rating", destination_rating)?;
    let coefficient = cfg.coefficient(group).ok_or_else(|| {
        SimError::InvalidInput(format!("no position coefficient configured for {group}"))
    })?;
    ensure_finite("position coefficient", coefficient)?;

    let ratio = (destination_rating / origin_rating.max(cfg.epsilon))
        .clamp(cfg.min_ratio, cfg.max_ratio);
    Ok((current_metric * ratio * coefficient).max(0.0))
}

/// [`project`] with the group given by name, for callers holding raw text.
pub fn project_named(
    current_metric: f64,
    origin_rating: f64,
    destination_rating: f64,
    group: &str,
    cfg: &ProjectorConfig,
) -> SimResult<f64> {
    let group = group.parse::<PositionGroup>()?;
    project(current_metric, origin_rating, destination_rating, group, cfg)
}

pub fn projection_result(
    current_metric: f64,
    origin_rating: f64,
    destination_rating: f64,
    group: PositionGroup,
    cfg: &ProjectorConfig,
) -> SimResult<ProjectionResult> {
    let projected = project(current_metric, origin_rating, destination_rating, group, cfg)?;
    Ok(ProjectionResult::new(current_metric, projected))
}
