use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use transfer_lab::config::{AppPaths, ProjectorConfig, ScaleConfig};
use transfer_lab::export::export_comparison_xlsx;
use transfer_lab::players::{load_player_rows, metric_names, season_rows};
use transfer_lab::projector::TransferScenario;
use transfer_lab::ratings::{self, RatingTables};
use transfer_lab::simulation::{SimulationRequest, destination_league, simulate_player_transfer};

const USAGE: &str = "usage:
  transfer_lab --player NAME --team TEAM [--league LEAGUE] [--metrics a,b] [--position-scaling] [--xlsx PATH]
  transfer_lab --value X --from TEAM --to TEAM --position POS [--player NAME]
common: [--players PATH] [--ratings PATH] [--season YYYY-YY]";

fn main() -> Result<()> {
    transfer_lab::load_dotenv();
    transfer_lab::init_tracing();

    if has_flag("--help") || has_flag("-h") {
        println!("{USAGE}");
        return Ok(());
    }

    let mut paths = AppPaths::from_env();
    if let Some(p) = parse_str_arg("--players") {
        paths.players_csv = Some(PathBuf::from(p));
    }
    if let Some(p) = parse_str_arg("--ratings") {
        paths.ratings_csv = Some(PathBuf::from(p));
    }
    if let Some(s) = parse_str_arg("--season") {
        paths.season = s;
    }

    let cfg = ProjectorConfig::from_env()?;
    let ratings_path = paths
        .ratings_csv
        .clone()
        .context("no team ratings csv (pass --ratings or set TRANSFER_LAB_RATINGS_CSV)")?;
    let tables = ratings::install_global(RatingTables::load(&ratings_path, &cfg)?)?;

    if let Some(value) = parse_f64_arg("--value") {
        return run_projection(value, tables, &cfg);
    }
    run_simulation(&paths, tables)
}

fn run_projection(value: f64, tables: &RatingTables, cfg: &ProjectorConfig) -> Result<()> {
    let from = parse_str_arg("--from").ok_or_else(|| anyhow!("--from is required\n{USAGE}"))?;
    let to = parse_str_arg("--to").ok_or_else(|| anyhow!("--to is required\n{USAGE}"))?;
    let position = parse_str_arg("--position").unwrap_or_default();
    let player = parse_str_arg("--player").unwrap_or_else(|| "player".to_string());

    let scenario = TransferScenario::resolve(&player, &position, value, &from, &to, &tables.teams);
    let result = scenario.project(cfg)?;
    let out = serde_json::json!({ "scenario": scenario, "result": result });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn run_simulation(paths: &AppPaths, tables: &RatingTables) -> Result<()> {
    let player = parse_str_arg("--player").ok_or_else(|| anyhow!("--player is required\n{USAGE}"))?;
    let team = parse_str_arg("--team").ok_or_else(|| anyhow!("--team is required\n{USAGE}"))?;
    let players_path = paths
        .players_csv
        .as_ref()
        .context("no player csv (pass --players or set TRANSFER_LAB_PLAYERS_CSV)")?;

    let all_rows = load_player_rows(players_path)?;
    let rows: Vec<_> = season_rows(&all_rows, &paths.season)
        .into_iter()
        .cloned()
        .collect();
    if rows.is_empty() {
        return Err(anyhow!("no player rows for season {}", paths.season));
    }

    let league = parse_str_arg("--league")
        .or_else(|| destination_league(&rows, &team).map(str::to_string))
        .ok_or_else(|| anyhow!("cannot infer league for {team}; pass --league"))?;
    let metrics = match parse_str_arg("--metrics") {
        Some(raw) => raw
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect(),
        None => metric_names(&rows),
    };

    let request = SimulationRequest {
        player: &player,
        metrics: &metrics,
        destination_team: &team,
        destination_league: &league,
        position_scaling: has_flag("--position-scaling"),
    };
    let comparison = simulate_player_transfer(&rows, &request, tables, &ScaleConfig::default())?;
    println!("{}", serde_json::to_string_pretty(&comparison)?);

    if let Some(path) = parse_str_arg("--xlsx") {
        let path = PathBuf::from(path);
        export_comparison_xlsx(&path, &comparison)?;
        info!(path = %path.display(), "comparison workbook written");
    }
    Ok(())
}

fn parse_str_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && !raw.trim().is_empty()
        {
            return Some(raw.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_f64_arg(name: &str) -> Option<f64> {
    parse_str_arg(name).and_then(|raw| raw.parse::<f64>().ok())
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
