use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

use super::{FEATURE_COUNT, Features};
use crate::error::{SimError, SimResult};

const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn (without replacement) for each tree.
    pub subsample: f64,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 4,
            learning_rate: 0.1,
            min_samples_leaf: 1,
            subsample: 1.0,
            seed: 42,
        }
    }
}

impl BoostingParams {
    fn validate(&self) -> SimResult<()> {
        if self.n_estimators == 0 || self.max_depth == 0 || self.min_samples_leaf == 0 {
            return Err(SimError::InvalidInput(
                "n_estimators, max_depth and min_samples_leaf must be positive".to_string(),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(SimError::InvalidInput(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(SimError::InvalidInput(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Squared-loss regression tree stored as a flat node list; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn predict(&self, x: &Features) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes[idx] {
                Node::Leaf(_) => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }

    fn fit(
        xs: &[Features],
        residuals: &[f64],
        rows: Vec<usize>,
        params: &BoostingParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(xs, residuals, rows, 0, params);
        tree
    }

    fn grow(
        &mut self,
        xs: &[Features],
        residuals: &[f64],
        rows: Vec<usize>,
        depth: usize,
        params: &BoostingParams,
    ) -> usize {
        let idx = self.nodes.len();
        let mean = rows.iter().map(|&r| residuals[r]).sum::<f64>() / rows.len().max(1) as f64;
        self.nodes.push(Node::Leaf(mean));

        if depth >= params.max_depth || rows.len() < 2 * params.min_samples_leaf {
            return idx;
        }
        let Some(split) = best_split(xs, residuals, &rows, params.min_samples_leaf) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| xs[r][split.feature] <= split.threshold);
        let left = self.grow(xs, residuals, left_rows, depth + 1, params);
        let right = self.grow(xs, residuals, right_rows, depth + 1, params);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Exhaustive search over features and midpoints between distinct values.
fn best_split(
    xs: &[Features],
    residuals: &[f64],
    rows: &[usize],
    min_leaf: usize,
) -> Option<Split> {
    let n = rows.len();
    let total: f64 = rows.iter().map(|&r| residuals[r]).sum();
    let parent_score = total * total / n as f64;

    let mut best: Option<Split> = None;
    let mut order = rows.to_vec();
    for feature in 0..FEATURE_COUNT {
        order.sort_by(|&a, &b| xs[a][feature].total_cmp(&xs[b][feature]).then(a.cmp(&b)));

        let mut left_sum = 0.0;
        for pos in 0..n - 1 {
            left_sum += residuals[order[pos]];
            let left_n = pos + 1;
            let right_n = n - left_n;
            if left_n < min_leaf || right_n < min_leaf {
                continue;
            }
            let here = xs[order[pos]][feature];
            let next = xs[order[pos + 1]][feature];
            if here == next {
                continue;
            }
            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64
                - parent_score;
            if gain > MIN_GAIN && best.as_ref().is_none_or(|b| gain > b.gain) {
                best = Some(Split {
                    feature,
                    threshold: (here + next) / 2.0,
                    gain,
                });
            }
        }
    }
    best
}

/// Gradient-boosted regression trees with squared loss.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoostedModel {
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<RegressionTree>,
    pub train_samples: usize,
}

impl BoostedModel {
    pub fn fit(xs: &[Features], ys: &[f64], params: &BoostingParams) -> SimResult<Self> {
        params.validate()?;
        let n = xs.len();
        if n == 0 || n != ys.len() {
            return Err(SimError::InsufficientData(format!(
                "{} feature rows for {} labels",
                n,
                ys.len()
            )));
        }

        let init = ys.iter().sum::<f64>() / n as f64;
        let mut current = vec![init; n];
        let mut residuals = vec![0.0; n];
        let mut rng = StdRng::seed_from_u64(params.seed);
        let sample_n = ((n as f64 * params.subsample).round() as usize).clamp(1, n);

        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            for i in 0..n {
                residuals[i] = ys[i] - current[i];
            }
            let rows = if sample_n < n {
                let mut picked = index::sample(&mut rng, n, sample_n).into_vec();
                picked.sort_unstable();
                picked
            } else {
                (0..n).collect()
            };
            let tree = RegressionTree::fit(xs, &residuals, rows, params);
            for i in 0..n {
                current[i] += params.learning_rate * tree.predict(&xs[i]);
            }
            trees.push(tree);
        }

        Ok(Self {
            init,
            learning_rate: params.learning_rate,
            trees,
            train_samples: n,
        })
    }

    pub fn predict(&self, x: &Features) -> f64 {
        self.init
            + self
                .trees
                .iter()
                .map(|t| self.learning_rate * t.predict(x))
                .sum::<f64>()
    }
}
