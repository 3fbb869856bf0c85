use std::path::PathBuf;

use anyhow::Result;

use transfer_lab::dummy::{DEFAULT_PLAYERS, DEFAULT_SEED, generate_dummy_dataset};
use transfer_lab::export::export_dataset_csv;

fn main() -> Result<()> {
    transfer_lab::load_dotenv();
    transfer_lab::init_tracing();

    let out = parse_str_arg("--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/dummy_transfers.csv"));
    let players = parse_u64_arg("--players")
        .map(|n| n.max(1) as usize)
        .unwrap_or(DEFAULT_PLAYERS);
    let seed = parse_u64_arg("--seed").unwrap_or(DEFAULT_SEED);

    let rows = generate_dummy_dataset(players, seed)?;
    export_dataset_csv(&out, &rows)?;
    println!("{} rows written: {}", rows.len(), out.display());
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

fn parse_u64_arg(name: &str) -> Option<u64> {
    parse_str_arg(name).and_then(|raw| raw.parse::<u64>().ok())
}
