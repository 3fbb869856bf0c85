/// Failures raised at the boundary of the pure computations.
///
/// Rating lookup misses are not errors; they resolve to the configured default.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("player `{0}` not found")]
    UnknownPlayer(String),
}

pub type SimResult<T> = std::result::Result<T, SimError>;

pub(crate) fn ensure_finite(label: &str, value: f64) -> SimResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidInput(format!("{label} must be finite, got {value}")))
    }
}
