use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::players::PlayerSeasonRow;
use crate::position::map_position;
use crate::regression::TrainingRow;

/// A player seen at two different clubs in consecutive seasons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferPair<'a> {
    pub player: &'a str,
    pub before: &'a PlayerSeasonRow,
    pub after: &'a PlayerSeasonRow,
}

static RESERVE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(U\d+|II|III|IV|B|C)$").expect("reserve suffix pattern")
});

/// Club name without a trailing youth/reserve marker (`U21`, `II`, `B`, ...).
pub fn main_club_name(team: &str) -> String {
    RESERVE_SUFFIX.replace(team, "").trim().to_string()
}

/// Players whose main club differs between `season1` and `season2`.
///
/// A player counts as moved when any of their season-one rows and any of their
/// season-two rows name different main clubs. Each side of the pair is then
/// the row with the most minutes in that season. Pairs are ordered by player name.
pub fn find_transfers<'a>(
    rows: &'a [PlayerSeasonRow],
    season1: &str,
    season2: &str,
) -> Vec<TransferPair<'a>> {
    let mut by_player: BTreeMap<&str, (Vec<&PlayerSeasonRow>, Vec<&PlayerSeasonRow>)> =
        BTreeMap::new();
    for row in rows {
        let slot = by_player.entry(row.player.as_str()).or_default();
        match row.season.as_deref() {
            Some(s) if s == season1 => slot.0.push(row),
            Some(s) if s == season2 => slot.1.push(row),
            _ => {}
        }
    }

    let mut out = Vec::new();
    for (player, (earlier, later)) in by_player {
        let moved = earlier.iter().any(|a| {
            let from = main_club_name(&a.parent_team).to_lowercase();
            later
                .iter()
                .any(|b| main_club_name(&b.parent_team).to_lowercase() != from)
        });
        if !moved {
            continue;
        }
        let (Some(before), Some(after)) = (most_minutes(&earlier), most_minutes(&later)) else {
            continue;
        };
        out.push(TransferPair {
            player,
            before,
            after,
        });
    }
    debug!(season1, season2, transfers = out.len(), "transfer pairs extracted");
    out
}

/// First row with the highest minutes.
fn most_minutes<'a>(rows: &[&'a PlayerSeasonRow]) -> Option<&'a PlayerSeasonRow> {
    rows.iter()
        .copied()
        .fold(None, |best: Option<&PlayerSeasonRow>, row| match best {
            Some(b) if b.minutes >= row.minutes => Some(b),
            _ => Some(row),
        })
}

/// Training rows for `metric` from the transfers between two seasons. Pairs
/// missing the metric or the age are skipped.
pub fn transfer_training_rows(
    rows: &[PlayerSeasonRow],
    season1: &str,
    season2: &str,
    metric: &str,
) -> Vec<TrainingRow> {
    find_transfers(rows, season1, season2)
        .into_iter()
        .filter_map(|pair| {
            Some(TrainingRow {
                pre_metric: pair.before.metric(metric)?,
                age: pair.before.age?,
                group: pair.before.group,
                post_metric: pair.after.metric(metric)?,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawTrainingRow {
    pre_metric: f64,
    age: f64,
    position: String,
    post_metric: f64,
}

/// Reads `pre_metric,age,position,post_metric` rows. Rows that fail to parse,
/// carry non-finite values or a non-outfield position are skipped.
pub fn training_rows_from_reader<R: Read>(rdr: R) -> Result<Vec<TrainingRow>> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut out = Vec::new();
    for (line, result) in reader.deserialize::<RawTrainingRow>().enumerate() {
        let raw = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed training row {}: {}", line + 2, e);
                continue;
            }
        };
        let group = map_position(&raw.position);
        let finite = raw.pre_metric.is_finite() && raw.post_metric.is_finite() && raw.age.is_finite();
        if !finite || raw.age < 0.0 || !group.is_outfield() {
            warn!("skipping training row {}: unusable values", line + 2);
            continue;
        }
        out.push(TrainingRow {
            pre_metric: raw.pre_metric,
            age: raw.age as u32,
            group,
            post_metric: raw.post_metric,
        });
    }
    Ok(out)
}

pub fn load_training_rows(path: &Path) -> Result<Vec<TrainingRow>> {
    let file = File::open(path).with_context(|| format!("open training rows {}", path.display()))?;
    let rows = training_rows_from_reader(file)
        .with_context(|| format!("read training rows {}", path.display()))?;
    info!(rows = rows.len(), path = %path.display(), "training rows loaded");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionGroup;

    fn row(player: &str, team: &str, season: &str, minutes: f64, goals: f64) -> PlayerSeasonRow {
        PlayerSeasonRow {
            player: player.to_string(),
            parent_team: team.to_string(),
            team: team.to_string(),
            league: format!("Test League {season}"),
            season: Some(season.to_string()),
            main_position: "CF".to_string(),
            position: "CF".to_string(),
            group: PositionGroup::Forward,
            age: Some(25),
            minutes,
            metrics: BTreeMap::from([("Goals".to_string(), goals)]),
        }
    }

    #[test]
    fn strips_reserve_suffixes() {
        assert_eq!(main_club_name("Real Madrid B"), "Real Madrid");
        assert_eq!(main_club_name("Arsenal U21"), "Arsenal");
        assert_eq!(main_club_name("Bayern München II"), "Bayern München");
        assert_eq!(main_club_name("Club Brugge"), "Club Brugge");
        assert_eq!(main_club_name("Union"), "Union");
        assert_eq!(main_club_name("Sporting CP b"), "Sporting CP");
        assert_eq!(main_club_name("Bristol City III"), "Bristol City");
        assert_eq!(main_club_name("Leeds U"), "Leeds U");
        assert_eq!(main_club_name(""), "");
    }

    #[test]
    fn detects_club_changes_only() {
        let rows = vec![
            row("Mover", "Brentford", "2024-25", 2000.0, 0.4),
            row("Mover", "Arsenal", "2025-26", 1500.0, 0.5),
            row("Stayer", "Chelsea", "2024-25", 2000.0, 0.2),
            row("Stayer", "Chelsea U21", "2025-26", 300.0, 0.3),
            row("Single", "Fulham", "2025-26", 900.0, 0.1),
        ];
        let pairs = find_transfers(&rows, "2024-25", "2025-26");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].player, "Mover");
        assert_eq!(pairs[0].after.parent_team, "Arsenal");
    }

    #[test]
    fn loan_row_beside_parent_club_counts_as_move() {
        let rows = vec![
            row("Loanee", "Chelsea", "2024-25", 2000.0, 0.4),
            row("Loanee", "Chelsea", "2025-26", 1500.0, 0.35),
            row("Loanee", "Fulham", "2025-26", 300.0, 0.6),
        ];
        let pairs = find_transfers(&rows, "2024-25", "2025-26");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].before.parent_team, "Chelsea");
        assert_eq!(pairs[0].after.parent_team, "Chelsea");
        assert_eq!(pairs[0].after.minutes, 1500.0);
    }

    #[test]
    fn keeps_row_with_most_minutes() {
        let rows = vec![
            row("Loanee", "Brentford", "2024-25", 2000.0, 0.4),
            row("Loanee", "Arsenal", "2025-26", 200.0, 0.9),
            row("Loanee", "Lyon", "2025-26", 1800.0, 0.3),
        ];
        let training = transfer_training_rows(&rows, "2024-25", "2025-26", "Goals");
        assert_eq!(training.len(), 1);
        assert_eq!(training[0].pre_metric, 0.4);
        assert_eq!(training[0].post_metric, 0.3);
        assert_eq!(training[0].age, 25);
    }

    #[test]
    fn training_csv_skips_unusable_rows() {
        let csv = "pre_metric,age,position,post_metric\n\
                   0.4,24,FW,0.35\n\
                   0.1,30,Defender,0.08\n\
                   0.0,28,GK,0.0\n\
                   abc,22,MF,0.1\n";
        let rows = training_rows_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group, PositionGroup::Forward);
        assert_eq!(rows[1].group, PositionGroup::Defender);
        assert_eq!(rows[1].age, 30);
    }
}
