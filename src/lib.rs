pub mod config;
pub mod dummy;
pub mod error;
pub mod export;
pub mod players;
pub mod position;
pub mod projector;
pub mod ratings;
pub mod regression;
pub mod scaling;
pub mod simulation;
pub mod transfers;

pub use error::{SimError, SimResult};
pub use position::{PositionGroup, map_position};
pub use projector::{ProjectionResult, project};
pub use ratings::RatingTable;
pub use regression::{FittedModel, ModelKind, TrainingRow, fit, predict};

/// Install the fmt subscriber used by the binaries. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load `.env.local` then `.env`; earlier files win.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}
