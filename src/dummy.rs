use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::position::{PositionGroup, map_position};
use crate::regression::TrainingRow;

pub const DEFAULT_PLAYERS: usize = 2000;
pub const DEFAULT_SEED: u64 = 42;

const POSITIONS: [(&str, f64); 4] = [("GK", 0.1), ("DF", 0.3), ("MF", 0.35), ("FW", 0.25)];

/// Synthetic player who moved from league A to league B.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyTransfer {
    #[serde(rename = "Player")]
    pub player: String,
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Position")]
    pub position: String,
    #[serde(rename = "Minutes_A")]
    pub minutes_a: u32,
    #[serde(rename = "Minutes_B")]
    pub minutes_b: u32,
    #[serde(rename = "Goals_A")]
    pub goals_a: u32,
    #[serde(rename = "Goals_B")]
    pub goals_b: u32,
    #[serde(rename = "Goals_p90_A")]
    pub goals_p90_a: f64,
    #[serde(rename = "Goals_p90_B")]
    pub goals_p90_b: f64,
}

impl DummyTransfer {
    pub fn group(&self) -> PositionGroup {
        map_position(&self.position)
    }

    pub fn to_training_row(&self) -> TrainingRow {
        TrainingRow {
            pre_metric: self.goals_p90_a,
            age: self.age,
            group: self.group(),
            post_metric: self.goals_p90_b,
        }
    }
}

/// Per-90 base rate and its clamp range for one outfield position.
struct BaseRate {
    dist: Normal<f64>,
    lo: f64,
    hi: f64,
}

impl BaseRate {
    fn new(mean: f64, std: f64, lo: f64, hi: f64) -> SimResult<Self> {
        let dist = Normal::new(mean, std)
            .map_err(|e| SimError::InvalidInput(format!("base rate N({mean}, {std}): {e}")))?;
        Ok(Self { dist, lo, hi })
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        self.dist.sample(rng).clamp(self.lo, self.hi)
    }
}

/// Seeded synthetic dataset: league B is harder, so per-90 output drops by
/// 10-40% depending on position, and age bends output around a 23-28 peak.
pub fn generate_dummy_dataset(n_players: usize, seed: u64) -> SimResult<Vec<DummyTransfer>> {
    let positions = WeightedIndex::new(POSITIONS.iter().map(|(_, w)| *w))
        .map_err(|e| SimError::InvalidInput(format!("position weights: {e}")))?;
    let ages = Normal::<f64>::new(26.0, 4.0)
        .map_err(|e| SimError::InvalidInput(format!("age distribution: {e}")))?;
    let defender = BaseRate::new(0.1, 0.05, 0.0, 0.3)?;
    let midfielder = BaseRate::new(0.3, 0.15, 0.0, 0.8)?;
    let forward = BaseRate::new(0.6, 0.2, 0.1, 1.2)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(n_players);

    for i in 0..n_players {
        let position = POSITIONS[positions.sample(&mut rng)].0;
        let age = ages.sample(&mut rng).clamp(18.0, 40.0) as u32;
        let age_factor = if age < 23 {
            0.85 + (age as f64 - 18.0) * 0.03
        } else if age <= 28 {
            1.0
        } else {
            1.0 - (age as f64 - 28.0) * 0.02
        };

        let minutes_a = rng.gen_range(500..3000u32);
        let minutes_b = rng.gen_range(500..3000u32);

        let (p90_a, p90_b) = match position {
            "GK" => (0.0, 0.0),
            "DF" => {
                let a = defender.sample(&mut rng) * age_factor;
                (a, a * rng.gen_range(0.7..0.9))
            }
            "MF" => {
                let a = midfielder.sample(&mut rng) * age_factor;
                (a, a * rng.gen_range(0.65..0.85))
            }
            _ => {
                let a = forward.sample(&mut rng) * age_factor;
                (a, a * rng.gen_range(0.6..0.8))
            }
        };

        let mut goals_a = (p90_a * minutes_a as f64 / 90.0) as i64;
        let mut goals_b = (p90_b * minutes_b as f64 / 90.0) as i64;
        if position != "GK" {
            goals_a = (goals_a + rng.gen_range(-2..3i64)).max(0);
            goals_b = (goals_b + rng.gen_range(-2..3i64)).max(0);
        }

        out.push(DummyTransfer {
            player: format!("Player_{}", i + 1),
            age,
            position: position.to_string(),
            minutes_a,
            minutes_b,
            goals_a: goals_a as u32,
            goals_b: goals_b as u32,
            goals_p90_a: per90(goals_a, minutes_a),
            goals_p90_b: per90(goals_b, minutes_b),
        });
    }
    Ok(out)
}

/// Outfield rows of the dummy dataset as regression input.
pub fn dummy_training_rows(rows: &[DummyTransfer]) -> Vec<TrainingRow> {
    rows.iter()
        .filter(|r| r.group().is_outfield())
        .map(DummyTransfer::to_training_row)
        .collect()
}

fn per90(goals: i64, minutes: u32) -> f64 {
    if minutes == 0 {
        return 0.0;
    }
    (goals as f64 / minutes as f64 * 90.0 * 100.0).round() / 100.0
}
