use serde::Serialize;

use crate::config::ScaleConfig;

/// Team and league context for one metric of one move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScaleInputs {
    pub from_team_rating: f64,
    pub to_team_rating: f64,
    pub from_league_rating: f64,
    pub to_league_rating: f64,
    pub position_averages: Option<PositionAverages>,
}

/// Mean of the metric over the player's position group at each end of the move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PositionAverages {
    pub from_team: Option<f64>,
    pub to_team: Option<f64>,
    pub from_league: Option<f64>,
    pub to_league: Option<f64>,
}

/// Team ratio is destination over origin, league ratio is origin over
/// destination. Both are raised to `rating_sensitivity`.
pub fn scale_multiplier(inputs: &ScaleInputs, cfg: &ScaleConfig) -> f64 {
    let team_ratio = if inputs.from_team_rating > 0.0 {
        inputs.to_team_rating / inputs.from_team_rating
    } else {
        1.0
    };
    let league_ratio = if inputs.to_league_rating > 0.0 {
        inputs.from_league_rating / inputs.to_league_rating
    } else {
        1.0
    };

    let base = team_ratio.powf(cfg.rating_sensitivity) * league_ratio.powf(cfg.rating_sensitivity);

    let context = match inputs.position_averages {
        Some(avgs) => {
            context_factor(avgs.from_team, avgs.to_team, cfg.position_weight)
                * context_factor(avgs.from_league, avgs.to_league, cfg.position_weight)
        }
        None => 1.0,
    };

    let multiplier = base * context;
    if multiplier.is_finite() {
        multiplier.clamp(cfg.min_multiplier, cfg.max_multiplier)
    } else {
        1.0
    }
}

/// `value` scaled by [`scale_multiplier`], rounded to 2 decimals.
pub fn scale_metric(value: f64, inputs: &ScaleInputs, cfg: &ScaleConfig) -> f64 {
    round2(value * scale_multiplier(inputs, cfg))
}

fn context_factor(from: Option<f64>, to: Option<f64>, weight: f64) -> f64 {
    match (from, to) {
        (Some(from), Some(to)) if from > 0.0 && to > 0.0 && from.is_finite() && to.is_finite() => {
            (to / from).powf(weight)
        }
        _ => 1.0,
    }
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
