use std::path::PathBuf;

use transfer_lab::config::{DEFAULT_RATING, ProjectorConfig};
use transfer_lab::ratings::{self, RatingTables, load_team_rating_records};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn tables() -> RatingTables {
    RatingTables::load(&fixture_path("team_ratings.csv"), &ProjectorConfig::default())
        .expect("fixture ratings should load")
}

#[test]
fn malformed_rows_are_skipped() {
    let records = load_team_rating_records(&fixture_path("team_ratings.csv")).unwrap();
    assert_eq!(records.len(), 7);
    assert!(records.iter().all(|r| r.team != "Broken FC"));
    let celtic = records.iter().find(|r| r.team == "Celtic").unwrap();
    assert_eq!(celtic.league_id, None);
}

#[test]
fn present_names_return_stored_rating() {
    let tables = tables();
    assert_eq!(tables.teams.get_rating("Arsenal"), 90.0);
    assert_eq!(tables.teams.get_rating("  arsenal "), 90.0);
    assert_eq!(tables.teams.get_rating("Celtic"), 66.0);
}

#[test]
fn aliases_resolve_to_dataset_names() {
    let tables = tables();
    assert_eq!(tables.teams.get_rating("Lyon"), 72.0);
    assert_eq!(tables.teams.get_rating("Manchester City"), 88.0);
    assert!(!tables.teams.contains("Olympique Lyonnais"));
}

#[test]
fn absent_names_return_default() {
    let tables = tables();
    assert_eq!(tables.teams.get_rating("Unknown FC"), DEFAULT_RATING);
    assert_eq!(tables.teams.get_rating("Broken FC"), DEFAULT_RATING);
    // Ajax's league id is not one of the covered leagues.
    assert_eq!(tables.teams.get_rating("Ajax"), DEFAULT_RATING);
}

#[test]
fn league_ratings_are_team_averages() {
    let tables = tables();
    assert_eq!(tables.leagues.len(), 2);
    assert_eq!(
        tables.leagues.get_league_rating("England Premier League 2025-26"),
        82.667
    );
    assert_eq!(tables.leagues.get_league_rating("France Ligue 1 2025-26"), 68.0);
    assert_eq!(
        tables
            .leagues
            .get_league_rating("England Premier League 2025-26 (Regular Season)"),
        82.667
    );
    assert_eq!(
        tables.leagues.get_league_rating("Spain La Liga 2025-26"),
        DEFAULT_RATING
    );
}

#[test]
fn global_tables_install_once() {
    assert!(ratings::global().is_none());
    let installed = ratings::install_global(tables()).unwrap();
    assert_eq!(installed.teams.get_rating("Nice"), 64.0);
    assert!(ratings::global().is_some());
    assert!(ratings::install_global(tables()).is_err());
}
