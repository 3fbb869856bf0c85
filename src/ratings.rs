use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ProjectorConfig;

/// Opta domestic league ids for the five leagues the player dataset covers.
pub const LEAGUE_ID_TO_NAME: &[(&str, &str)] = &[
    ("2kwbbcootiqqgmrzs6o5inle5", "England Premier League 2025-26"),
    ("6by3h89i2eykc341oz7lv1ddd", "Germany Bundesliga 2025-26"),
    ("1r097lpxe0xn03ihb7wi98kao", "Italy Serie A 2025-26"),
    ("34pl8szyvrbwcmfkuocjm3r6t", "Spain La Liga 2025-26"),
    ("dm5ka0os1e3dxcp3vh05kmp33", "France Ligue 1 2025-26"),
];

/// Power-ranking display names that differ from the player dataset's names.
pub const TEAM_NAME_ALIASES: &[(&str, &str)] = &[
    ("Manchester City FC", "Manchester City"),
    ("Manchester United FC", "Manchester United"),
    ("Tottenham Hotspur", "Tottenham"),
    ("Wolverhampton Wanderers", "Wolverhampton"),
    ("Brighton & Hove Albion", "Brighton"),
    ("Newcastle United", "Newcastle"),
    ("West Ham United", "West Ham"),
    ("Nottingham Forest", "Nottm Forest"),
    ("Bayern München", "Bayern Munich"),
    ("Borussia Mönchengladbach", "Gladbach"),
    ("Bayer 04 Leverkusen", "Leverkusen"),
    ("Internazionale", "Inter"),
    ("AC Milan", "Milan"),
    ("Atlético de Madrid", "Atlético Madrid"),
    ("Athletic Club", "Athletic Bilbao"),
    ("Paris Saint-Germain", "PSG"),
    ("Olympique de Marseille", "Marseille"),
    ("Olympique Lyonnais", "Lyon"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct TeamRatingRecord {
    pub team: String,
    pub rating: f64,
    pub league_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawTeamRating {
    contestantName: String,
    currentRating: f64,
    #[serde(default)]
    domesticLeagueId: Option<String>,
}

/// Name → power rating, with a default for names that are not present.
#[derive(Debug, Clone)]
pub struct RatingTable {
    by_key: HashMap<String, (String, f64)>,
    default_rating: f64,
}

impl RatingTable {
    pub fn new(default_rating: f64) -> Self {
        Self {
            by_key: HashMap::new(),
            default_rating,
        }
    }

    pub fn insert(&mut self, name: &str, rating: f64) {
        let key = normalize_name(name);
        if key.is_empty() {
            return;
        }
        self.by_key.insert(key, (name.trim().to_string(), rating));
    }

    pub fn default_rating(&self) -> f64 {
        self.default_rating
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<f64> {
        self.by_key.get(&normalize_name(name)).map(|(_, r)| *r)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn get_rating(&self, name: &str) -> f64 {
        match self.lookup(name) {
            Some(rating) => rating,
            None => {
                debug!(name, default = self.default_rating, "rating miss, using default");
                self.default_rating
            }
        }
    }

    /// League ratings are keyed by full names ("Spain La Liga 2025-26") while
    /// callers pass whatever their data carries. The longest stored name
    /// contained in `league` wins.
    pub fn get_league_rating(&self, league: &str) -> f64 {
        let text = normalize_name(league);
        if let Some(rating) = self.by_key.get(&text).map(|(_, r)| *r) {
            return rating;
        }
        let best = self
            .by_key
            .iter()
            .filter(|(key, _)| text.contains(key.as_str()))
            .max_by_key(|(key, _)| key.len());
        match best {
            Some((_, (_, rating))) => *rating,
            None => {
                debug!(league, default = self.default_rating, "league rating miss, using default");
                self.default_rating
            }
        }
    }

    /// Display names in alphabetical order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_key.values().map(|(n, _)| n.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn from_records(records: &[TeamRatingRecord], cfg: &ProjectorConfig) -> Self {
        let mut table = Self::new(cfg.default_rating);
        for rec in records {
            let name = canonical_team_name(&rec.team);
            table.insert(name, clamp_rating(name, rec.rating, cfg));
        }
        table
    }

    /// Average team rating per domestic league, rounded to 3 decimals.
    pub fn league_table(records: &[TeamRatingRecord], cfg: &ProjectorConfig) -> Self {
        let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for rec in records {
            let Some(id) = rec.league_id.as_deref() else {
                continue;
            };
            let slot = sums.entry(id).or_insert((0.0, 0));
            slot.0 += clamp_rating(&rec.team, rec.rating, cfg);
            slot.1 += 1;
        }

        let mut table = Self::new(cfg.default_rating);
        for (id, (sum, n)) in sums {
            let Some(name) = league_name(id) else {
                debug!(league_id = id, "no display name for league id");
                continue;
            };
            let avg = (sum / n as f64 * 1000.0).round() / 1000.0;
            table.insert(name, avg);
        }
        table
    }
}

/// Team and league tables loaded once per process.
#[derive(Debug, Clone)]
pub struct RatingTables {
    pub teams: RatingTable,
    pub leagues: RatingTable,
}

impl RatingTables {
    pub fn from_records(records: &[TeamRatingRecord], cfg: &ProjectorConfig) -> Self {
        let tables = Self {
            teams: RatingTable::from_records(records, cfg),
            leagues: RatingTable::league_table(records, cfg),
        };
        info!(
            teams = tables.teams.len(),
            leagues = tables.leagues.len(),
            "rating tables built"
        );
        tables
    }

    pub fn load(path: &Path, cfg: &ProjectorConfig) -> Result<Self> {
        let records = retain_known_leagues(load_team_rating_records(path)?);
        Ok(Self::from_records(&records, cfg))
    }
}

static GLOBAL_TABLES: OnceCell<RatingTables> = OnceCell::new();

pub fn install_global(tables: RatingTables) -> Result<&'static RatingTables> {
    GLOBAL_TABLES
        .set(tables)
        .map_err(|_| anyhow!("rating tables already installed"))?;
    GLOBAL_TABLES
        .get()
        .ok_or_else(|| anyhow!("rating tables missing after install"))
}

pub fn global() -> Option<&'static RatingTables> {
    GLOBAL_TABLES.get()
}

pub fn team_rating_records_from_reader<R: Read>(rdr: R) -> Result<Vec<TeamRatingRecord>> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut out = Vec::new();
    for result in reader.deserialize::<RawTeamRating>() {
        match result {
            Ok(raw) => {
                if !raw.currentRating.is_finite() {
                    warn!("skipping team '{}': non-finite rating", raw.contestantName.trim());
                    continue;
                }
                out.push(TeamRatingRecord {
                    team: raw.contestantName.trim().to_string(),
                    rating: raw.currentRating,
                    league_id: raw
                        .domesticLeagueId
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty()),
                });
            }
            Err(e) => warn!("skipping malformed rating row: {}", e),
        }
    }
    Ok(out)
}

pub fn load_team_rating_records(path: &Path) -> Result<Vec<TeamRatingRecord>> {
    let file = File::open(path).with_context(|| format!("open ratings {}", path.display()))?;
    team_rating_records_from_reader(file)
        .with_context(|| format!("read ratings {}", path.display()))
}

/// Keep records from the leagues in [`LEAGUE_ID_TO_NAME`]; records without a
/// league id are kept.
pub fn retain_known_leagues(records: Vec<TeamRatingRecord>) -> Vec<TeamRatingRecord> {
    records
        .into_iter()
        .filter(|r| r.league_id.as_deref().is_none_or(|id| league_name(id).is_some()))
        .collect()
}

pub fn league_name(league_id: &str) -> Option<&'static str> {
    LEAGUE_ID_TO_NAME
        .iter()
        .find(|(id, _)| *id == league_id)
        .map(|(_, name)| *name)
}

pub fn canonical_team_name(name: &str) -> &str {
    let trimmed = name.trim();
    TEAM_NAME_ALIASES
        .iter()
        .find(|(from, _)| *from == trimmed)
        .map(|(_, to)| *to)
        .unwrap_or(trimmed)
}

fn clamp_rating(name: &str, rating: f64, cfg: &ProjectorConfig) -> f64 {
    let clamped = rating.clamp(cfg.rating_min, cfg.rating_max);
    if clamped != rating {
        warn!(name, rating, clamped, "rating outside configured bounds");
    }
    clamped
}

pub fn normalize_name(input: &str) -> String {
    let lower = input.trim().to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut prev_us = false;
    for ch in lower.chars() {
        let mapped = if ch.is_alphanumeric() {
            Some(ch)
        } else if ch == '&' {
            Some('a')
        } else {
            None
        };

        if let Some(c) = mapped {
            out.push(c);
            prev_us = false;
        } else if !prev_us && !out.is_empty() {
            out.push('_');
            prev_us = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
