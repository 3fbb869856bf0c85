use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tracing::info;

use transfer_lab::config::AppPaths;
use transfer_lab::dummy::{DEFAULT_PLAYERS, DEFAULT_SEED, dummy_training_rows, generate_dummy_dataset};
use transfer_lab::regression::{
    FitOptions, ModelKind, ModelReport, PredictionSummary, SplitConfig, evaluate, outfield_rows,
    predict,
};
use transfer_lab::transfers::load_training_rows;
use transfer_lab::PositionGroup;

const DEFAULT_EXPECTED_MINUTES: f64 = 2000.0;

#[derive(Debug, Serialize)]
struct ModelOutput {
    report: ModelReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    prediction: Option<PredictionSummary>,
}

fn main() -> Result<()> {
    transfer_lab::load_dotenv();
    transfer_lab::init_tracing();

    let paths = AppPaths::from_env();
    let training_path = parse_str_arg("--training")
        .map(PathBuf::from)
        .or(paths.training_csv);

    let rows = match training_path {
        Some(path) => load_training_rows(&path)?,
        None => {
            let n = parse_f64_arg("--dummy-players")
                .map(|v| v.max(1.0) as usize)
                .unwrap_or(DEFAULT_PLAYERS);
            info!(players = n, "no training csv given, using generated dataset");
            dummy_training_rows(&generate_dummy_dataset(n, DEFAULT_SEED)?)
        }
    };
    let rows = outfield_rows(&rows);

    let kinds = match parse_str_arg("--model") {
        Some(raw) if raw != "all" => vec![raw.parse::<ModelKind>()?],
        _ => ModelKind::ALL.to_vec(),
    };

    let mut opts = FitOptions::default();
    if let Some(alpha) = parse_f64_arg("--alpha") {
        opts.ridge_alpha = alpha;
    }
    if let Some(n) = parse_f64_arg("--estimators") {
        opts.boosting.n_estimators = n.max(1.0) as usize;
    }
    let mut split = SplitConfig::default();
    if let Some(frac) = parse_f64_arg("--test-fraction") {
        split.test_fraction = frac;
    }
    if let Some(seed) = parse_f64_arg("--seed") {
        split.seed = seed.max(0.0) as u64;
        opts.boosting.seed = split.seed;
    }

    let query = match parse_f64_arg("--metric") {
        Some(metric) => {
            let age = parse_f64_arg("--age")
                .context("--age is required with --metric")?
                .max(0.0) as u32;
            let group = parse_str_arg("--position")
                .ok_or_else(|| anyhow!("--position is required with --metric"))?
                .parse::<PositionGroup>()?;
            let minutes = parse_f64_arg("--minutes").unwrap_or(DEFAULT_EXPECTED_MINUTES);
            Some((metric, age, group, minutes))
        }
        None => None,
    };

    let mut outputs = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let report = evaluate(&rows, kind, &opts, &split)?;
        info!(
            model = %kind,
            r2 = report.r2,
            mae = report.mae,
            "model evaluated"
        );
        let prediction = match query {
            Some((metric, age, group, minutes)) => {
                let raw = predict(&report.model, metric, age, group)?;
                Some(PredictionSummary::new(metric, raw, minutes))
            }
            None => None,
        };
        outputs.push(ModelOutput { report, prediction });
    }

    println!("{}", serde_json::to_string_pretty(&outputs)?);
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
