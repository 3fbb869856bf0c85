use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::config::ScaleConfig;
use crate::error::{SimError, SimResult};
use crate::players::PlayerSeasonRow;
use crate::position::PositionGroup;
use crate::ratings::RatingTables;
use crate::scaling::{PositionAverages, ScaleInputs, round2, scale_metric};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferContext {
    pub team: String,
    pub league: String,
    pub team_rating: f64,
    pub league_rating: f64,
    pub metrics: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferComparison {
    pub player: String,
    pub position_group: PositionGroup,
    pub current: TransferContext,
    pub potential: TransferContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_group_averages: Option<BTreeMap<String, PositionAverages>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison {
    pub metric: String,
    pub current: f64,
    pub predicted: f64,
    pub change: f64,
    pub change_pct: f64,
}

impl TransferComparison {
    /// Metrics present on both sides, in name order.
    pub fn metric_rows(&self) -> Vec<MetricComparison> {
        self.current
            .metrics
            .iter()
            .filter_map(|(name, current)| {
                let current = (*current)?;
                let predicted = self.potential.metrics.get(name).copied().flatten()?;
                let change = predicted - current;
                Some(MetricComparison {
                    metric: name.clone(),
                    current,
                    predicted,
                    change,
                    change_pct: if current != 0.0 {
                        change / current * 100.0
                    } else {
                        0.0
                    },
                })
            })
            .collect()
    }
}

/// A requested move of one player from the season dataset.
#[derive(Debug, Clone, Copy)]
pub struct SimulationRequest<'a> {
    pub player: &'a str,
    pub metrics: &'a [String],
    pub destination_team: &'a str,
    pub destination_league: &'a str,
    pub position_scaling: bool,
}

/// Rule-based projection of every requested metric for a player moving to
/// `destination_team`. `rows` should hold a single season.
pub fn simulate_player_transfer(
    rows: &[PlayerSeasonRow],
    request: &SimulationRequest<'_>,
    ratings: &RatingTables,
    cfg: &ScaleConfig,
) -> SimResult<TransferComparison> {
    let player = rows
        .iter()
        .find(|r| r.player == request.player)
        .ok_or_else(|| SimError::UnknownPlayer(request.player.to_string()))?;

    let cur_team_rating = ratings.teams.get_rating(&player.parent_team);
    let pot_team_rating = ratings.teams.get_rating(request.destination_team);
    let cur_league_rating = ratings.leagues.get_league_rating(&player.league);
    let pot_league_rating = ratings.leagues.get_league_rating(request.destination_league);
    debug!(
        player = request.player,
        cur_team_rating, pot_team_rating, cur_league_rating, pot_league_rating, "simulating transfer"
    );

    let mut current_metrics = BTreeMap::new();
    let mut potential_metrics = BTreeMap::new();
    let mut averages = BTreeMap::new();

    for metric in request.metrics {
        let value = player.metric(metric);
        current_metrics.insert(metric.clone(), value);

        let position_averages = if request.position_scaling {
            let avgs = PositionAverages {
                from_team: group_mean(rows, metric, player.group, |r| {
                    r.parent_team == player.parent_team
                }),
                to_team: group_mean(rows, metric, player.group, |r| {
                    r.parent_team == request.destination_team
                }),
                from_league: group_mean(rows, metric, player.group, |r| r.league == player.league),
                to_league: group_mean(rows, metric, player.group, |r| {
                    r.league == request.destination_league
                }),
            };
            averages.insert(metric.clone(), rounded(avgs));
            Some(avgs)
        } else {
            None
        };

        let scaled = value.map(|v| {
            let inputs = ScaleInputs {
                from_team_rating: cur_team_rating,
                to_team_rating: pot_team_rating,
                from_league_rating: cur_league_rating,
                to_league_rating: pot_league_rating,
                position_averages,
            };
            scale_metric(v, &inputs, cfg)
        });
        potential_metrics.insert(metric.clone(), scaled);
    }

    Ok(TransferComparison {
        player: player.player.clone(),
        position_group: player.group,
        current: TransferContext {
            team: player.parent_team.clone(),
            league: player.league.clone(),
            team_rating: cur_team_rating,
            league_rating: cur_league_rating,
            metrics: current_metrics,
        },
        potential: TransferContext {
            team: request.destination_team.to_string(),
            league: request.destination_league.to_string(),
            team_rating: pot_team_rating,
            league_rating: pot_league_rating,
            metrics: potential_metrics,
        },
        position_group_averages: request.position_scaling.then_some(averages),
    })
}

/// League of the first row whose parent team is `team`.
pub fn destination_league<'a>(rows: &'a [PlayerSeasonRow], team: &str) -> Option<&'a str> {
    rows.iter()
        .find(|r| r.parent_team == team)
        .map(|r| r.league.as_str())
}

fn group_mean(
    rows: &[PlayerSeasonRow],
    metric: &str,
    group: PositionGroup,
    filter: impl Fn(&PlayerSeasonRow) -> bool,
) -> Option<f64> {
    let (sum, n) = rows
        .iter()
        .filter(|r| r.group == group && filter(r))
        .filter_map(|r| r.metric(metric))
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn rounded(avgs: PositionAverages) -> PositionAverages {
    PositionAverages {
        from_team: avgs.from_team.map(round2),
        to_team: avgs.to_team.map(round2),
        from_league: avgs.from_league.map(round2),
        to_league: avgs.to_league.map(round2),
    }
}
