use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::position::{PositionGroup, map_position};

/// Columns that describe the player rather than measure performance.
const ID_COLUMNS: &[&str] = &[
    "Player",
    "Team",
    "Team within selected timeframe",
    "League",
    "Main Position",
    "Position",
    "Age",
    "Minutes played",
    "Season",
    "Position Group",
    "Parent Team",
];

/// One player-season row of the stats export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSeasonRow {
    pub player: String,
    /// Club the player is registered with.
    pub parent_team: String,
    /// Team within the selected timeframe (may be a loan or reserve side).
    pub team: String,
    pub league: String,
    pub season: Option<String>,
    pub main_position: String,
    pub position: String,
    pub group: PositionGroup,
    pub age: Option<u32>,
    pub minutes: f64,
    pub metrics: BTreeMap<String, f64>,
}

impl PlayerSeasonRow {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Minimal record the core operations consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    pub name: String,
    pub position: String,
    pub metric: f64,
    pub age: u32,
    pub team: String,
    pub league: String,
}

impl PlayerRecord {
    pub fn group(&self) -> PositionGroup {
        map_position(&self.position)
    }
}

pub fn player_rows_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerSeasonRow>> {
    let mut reader = csv::Reader::from_reader(rdr);
    let headers = reader.headers().context("read player csv header")?.clone();
    let col = |name: &str| headers.iter().position(|h| h.trim() == name);

    let player_idx = col("Player").ok_or_else(|| anyhow!("player csv has no `Player` column"))?;
    let parent_idx = col("Team");
    let team_idx = col("Team within selected timeframe");
    let league_idx = col("League");
    let main_pos_idx = col("Main Position");
    let pos_idx = col("Position");
    let age_idx = col("Age");
    let minutes_idx = col("Minutes played");

    let metric_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !ID_COLUMNS.contains(&h.trim()))
        .map(|(i, h)| (i, h.trim().to_string()))
        .collect();

    let mut out = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed player row {}: {}", line + 2, e);
                continue;
            }
        };
        let field = |idx: Option<usize>| -> String {
            idx.and_then(|i| record.get(i))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        let player = field(Some(player_idx));
        if player.is_empty() {
            warn!("skipping player row {}: empty name", line + 2);
            continue;
        }
        let team = field(team_idx);
        let mut parent_team = field(parent_idx);
        if parent_team.is_empty() {
            parent_team = team.clone();
        }
        let league = field(league_idx);
        let main_position = field(main_pos_idx);
        let position = field(pos_idx);
        let group_source = if main_position.is_empty() {
            &position
        } else {
            &main_position
        };

        let mut metrics = BTreeMap::new();
        for (idx, name) in &metric_cols {
            if let Some(value) = record.get(*idx).and_then(parse_number) {
                metrics.insert(name.clone(), value);
            }
        }

        out.push(PlayerSeasonRow {
            group: map_position(group_source),
            season: extract_season(&league),
            age: parse_number(&field(age_idx))
                .filter(|a| *a >= 0.0)
                .map(|a| a as u32),
            minutes: parse_number(&field(minutes_idx)).unwrap_or(0.0),
            player,
            parent_team,
            team,
            league,
            main_position,
            position,
            metrics,
        });
    }
    Ok(out)
}

pub fn load_player_rows(path: &Path) -> Result<Vec<PlayerSeasonRow>> {
    let file = File::open(path).with_context(|| format!("open players {}", path.display()))?;
    let rows = player_rows_from_reader(file)
        .with_context(|| format!("read players {}", path.display()))?;
    info!(rows = rows.len(), path = %path.display(), "player rows loaded");
    Ok(rows)
}

pub fn season_rows<'a>(rows: &'a [PlayerSeasonRow], season: &str) -> Vec<&'a PlayerSeasonRow> {
    rows.iter()
        .filter(|r| r.season.as_deref() == Some(season))
        .collect()
}

static SEASON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4}-\d{2})").expect("season pattern"));

/// First `dddd-dd` run in the league text, e.g. `"Spain La Liga 2025-26"` → `"2025-26"`.
pub fn extract_season(league: &str) -> Option<String> {
    SEASON
        .captures(league)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Sorted metric column names present on any row.
pub fn metric_names(rows: &[PlayerSeasonRow]) -> Vec<String> {
    let mut names: Vec<String> = rows
        .iter()
        .flat_map(|r| r.metrics.keys().cloned())
        .collect();
    names.sort();
    names.dedup();
    names
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%');
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Player,Team,Team within selected timeframe,League,Main Position,Position,Age,Minutes played,Goals,Assists,xG
A. Striker,,Brentford,England Premier League 2025-26,CF,\"CF, LW\",24,1800,0.61,0.12,0.55
B. Back,Arsenal,Arsenal U21,England Premier League 2024-25,LCB,LCB,29,2500,0.05,,0.04
,Arsenal,Arsenal,England Premier League 2024-25,GK,GK,30,900,0,0,0
";

    #[test]
    fn parses_rows_and_metrics() {
        let rows = player_rows_from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        let a = &rows[0];
        assert_eq!(a.parent_team, "Brentford");
        assert_eq!(a.season.as_deref(), Some("2025-26"));
        assert_eq!(a.group, PositionGroup::Forward);
        assert_eq!(a.age, Some(24));
        assert_eq!(a.minutes, 1800.0);
        assert_eq!(a.metric("Goals"), Some(0.61));
        assert!(!a.metrics.contains_key("Age"));

        let b = &rows[1];
        assert_eq!(b.parent_team, "Arsenal");
        assert_eq!(b.team, "Arsenal U21");
        assert_eq!(b.group, PositionGroup::Defender);
        assert_eq!(b.metric("Assists"), None);
    }

    #[test]
    fn season_extraction() {
        assert_eq!(extract_season("Italy Serie A 2024-25").as_deref(), Some("2024-25"));
        assert_eq!(extract_season("Serie A"), None);
        assert_eq!(extract_season("Ligue 1 2023-24 (2024-25 loan)").as_deref(), Some("2023-24"));
        assert_eq!(extract_season(""), None);
    }

    #[test]
    fn metric_names_are_sorted_and_unique() {
        let rows = player_rows_from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(metric_names(&rows), vec!["Assists", "Goals", "xG"]);
        assert_eq!(season_rows(&rows, "2024-25").len(), 1);
    }
}
